use std::sync::Arc;

use harvest_storage::ProbeFailurePolicy;

use super::*;
use crate::test_support::{GB, MemoryImages, MemoryStorage, image_ref};

struct Fixture {
    _tmp: tempfile::TempDir,
    store: CheckpointStore,
    storage: Arc<MemoryStorage>,
    images: Arc<MemoryImages>,
    distributor: BatchDistributor<MemoryImages, MemoryStorage>,
}

fn fixture(images: MemoryImages, storage: MemoryStorage, targets: &[&str], batch_size: usize) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(tmp.path().join("checkpoint.json"));
    let (stage, _) = Stage::prepare(tmp.path().join("stage")).unwrap();
    let storage = Arc::new(storage);
    let images = Arc::new(images);
    let router = TargetRouter::new(
        targets.iter().map(|t| t.to_string()).collect(),
        GB,
        ProbeFailurePolicy::AssumeUnlimited,
    );
    let distributor = BatchDistributor::new(
        images.clone(),
        storage.clone(),
        router,
        stage,
        FetchOptions {
            image_size: 16,
            ..FetchOptions::default()
        },
    )
    .batch_size(batch_size)
    .workers(16);
    Fixture {
        _tmp: tmp,
        store,
        storage,
        images,
        distributor,
    }
}

fn refs(ids: std::ops::Range<u64>) -> Vec<ImageRef> {
    ids.map(image_ref).collect()
}

#[tokio::test]
async fn failed_downloads_stay_undelivered() {
    let f = fixture(
        MemoryImages::new().failing([10, 200, 499]),
        MemoryStorage::new(&[("a", Some(5 * GB))]),
        &["a"],
        500,
    );
    let mut checkpoint = Checkpoint::new();

    let reports = f
        .distributor
        .distribute(refs(0..500), &mut checkpoint, &f.store)
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].delivered, 497);
    assert_eq!(reports[0].target.as_deref(), Some("a"));
    assert_eq!(reports[0].failed, vec![ImageId(10), ImageId(200), ImageId(499)]);
    assert_eq!(checkpoint.delivered.len(), 497);
    for id in [10, 200, 499] {
        assert!(!checkpoint.is_delivered(ImageId(id)));
        assert_eq!(checkpoint.attempts(ImageId(id)), 1);
    }
    assert_eq!(f.storage.files("a").len(), 497);
    assert_eq!(f.distributor.stage().staged_count().unwrap(), 0);
    assert_eq!(f.store.load().unwrap(), checkpoint);
}

#[tokio::test]
async fn splits_into_batches_and_saves_each() {
    let f = fixture(MemoryImages::new(), MemoryStorage::new(&[("a", None)]), &["a"], 4);
    let mut checkpoint = Checkpoint::new();

    let reports = f
        .distributor
        .distribute(refs(0..10), &mut checkpoint, &f.store)
        .await
        .unwrap();

    let sizes: Vec<usize> = reports.iter().map(|r| r.delivered).collect();
    assert_eq!(sizes, vec![4, 4, 2]);
    assert_eq!(f.storage.copies(), 3);
    assert_eq!(f.store.load().unwrap().delivered.len(), 10);
}

#[tokio::test]
async fn transfer_failure_records_nothing() {
    let f = fixture(MemoryImages::new(), MemoryStorage::new(&[("a", Some(5 * GB))]), &["a"], 500);
    let mut checkpoint = Checkpoint::with_delivered([ImageId(1000)]);
    f.store.save(&checkpoint).unwrap();
    let before = checkpoint.clone();
    f.storage.fail_copies(true);

    let err = f
        .distributor
        .distribute(refs(0..20), &mut checkpoint, &f.store)
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Transfer { ref target, .. } if target == "a"));
    assert_eq!(checkpoint, before);
    assert_eq!(f.store.load().unwrap(), before);
    assert_eq!(f.distributor.stage().staged_count().unwrap(), 0);
}

#[tokio::test]
async fn all_targets_full_is_fatal() {
    let f = fixture(
        MemoryImages::new(),
        MemoryStorage::new(&[("a", Some(GB / 2))]),
        &["a"],
        500,
    );
    let mut checkpoint = Checkpoint::new();

    let err = f
        .distributor
        .distribute(refs(0..3), &mut checkpoint, &f.store)
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::AllTargetsFull { tried: 1 }));
    assert!(checkpoint.delivered.is_empty());
    assert_eq!(f.storage.copies(), 0);
}

#[tokio::test]
async fn rolls_over_to_next_target() {
    let f = fixture(
        MemoryImages::new(),
        MemoryStorage::new(&[("a", Some(GB / 2)), ("b", Some(5 * GB))]),
        &["a", "b"],
        500,
    );
    let mut checkpoint = Checkpoint::new();

    let reports = f
        .distributor
        .distribute(refs(0..5), &mut checkpoint, &f.store)
        .await
        .unwrap();

    assert_eq!(reports[0].target.as_deref(), Some("b"));
    assert!(f.storage.files("a").is_empty());
    assert_eq!(f.storage.files("b").len(), 5);
}

#[tokio::test]
async fn batch_with_nothing_staged_skips_transfer() {
    let f = fixture(
        MemoryImages::new().failing([1, 2]),
        MemoryStorage::new(&[("a", Some(5 * GB))]),
        &["a"],
        500,
    );
    let mut checkpoint = Checkpoint::new();

    let reports = f
        .distributor
        .distribute(refs(1..3), &mut checkpoint, &f.store)
        .await
        .unwrap();

    assert_eq!(reports[0].target, None);
    assert_eq!(reports[0].failed.len(), 2);
    assert_eq!(f.storage.copies(), 0);
    assert_eq!(f.store.load().unwrap().attempts(ImageId(1)), 1);
}

#[tokio::test]
async fn delivered_items_are_skipped_without_download() {
    let images = MemoryImages::new();
    let f = fixture(images, MemoryStorage::new(&[("a", None)]), &["a"], 500);
    let mut checkpoint = Checkpoint::with_delivered([ImageId(0), ImageId(1)]);

    let reports = f
        .distributor
        .distribute(refs(0..4), &mut checkpoint, &f.store)
        .await
        .unwrap();

    assert_eq!(reports[0].skipped, 2);
    assert_eq!(reports[0].delivered, 2);
    assert!(reports[0].failed.is_empty());
    assert_eq!(f.storage.files("a").len(), 2);
}

#[tokio::test]
async fn unrecorded_stage_files_are_not_transferred() {
    let f = fixture(MemoryImages::new(), MemoryStorage::new(&[("a", None)]), &["a"], 10);
    let stage = f.distributor.stage();
    *f.images.litter.lock().unwrap() = vec![stage.path_for(ImageId(9999)), stage.dir().join("stray.tmp")];
    let mut checkpoint = Checkpoint::new();

    let reports = f
        .distributor
        .distribute(refs(0..10), &mut checkpoint, &f.store)
        .await
        .unwrap();

    assert_eq!(reports[0].delivered, 10);
    let sent = f.storage.files("a");
    assert_eq!(sent.len(), 10);
    assert!(!sent.contains("9999.jpg"));
    assert!(!sent.contains("stray.tmp"));
    assert!(!checkpoint.is_delivered(ImageId(9999)));
}

#[tokio::test]
async fn stage_cleanup_error_still_saves_checkpoint() {
    let f = fixture(
        MemoryImages::new().failing([3]),
        MemoryStorage::new(&[("a", None)]),
        &["a"],
        10,
    );
    // A directory in place of 3.jpg makes unlinking it fail.
    std::fs::create_dir(f.distributor.stage().path_for(ImageId(3))).unwrap();
    let mut checkpoint = Checkpoint::new();

    let reports = f
        .distributor
        .distribute(refs(0..10), &mut checkpoint, &f.store)
        .await
        .unwrap();

    assert_eq!(reports[0].delivered, 9);
    assert_eq!(f.storage.files("a").len(), 9);
    assert_eq!(checkpoint.delivered.len(), 9);
    assert_eq!(f.store.load().unwrap(), checkpoint);
}
