use std::collections::BTreeSet;

use super::*;
use crate::test_support::{MemoryImages, image_ref};

fn stage() -> (tempfile::TempDir, Stage) {
    let tmp = tempfile::tempdir().unwrap();
    let (stage, _) = Stage::prepare(tmp.path().join("stage")).unwrap();
    (tmp, stage)
}

#[tokio::test]
async fn stages_resized_jpeg() {
    let (_tmp, stage) = stage();
    let source = MemoryImages::new();
    let options = FetchOptions::default();

    let outcome = fetch_image(&source, &image_ref(42), &BTreeSet::new(), &stage, &options).await;
    assert_eq!(outcome, FetchOutcome::Staged(ImageId(42)));

    let staged = image::open(stage.path_for(ImageId(42))).unwrap();
    assert_eq!(staged.width(), 224);
    assert_eq!(staged.height(), 224);
    let bytes = std::fs::read(stage.path_for(ImageId(42))).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
}

#[tokio::test]
async fn requests_upgraded_https_url() {
    let (_tmp, stage) = stage();
    let source = MemoryImages::new();

    fetch_image(&source, &image_ref(7), &BTreeSet::new(), &stage, &FetchOptions::default()).await;

    let urls = source.urls.lock().unwrap().clone();
    assert_eq!(
        urls,
        vec!["https://images.example.com/igdb/image/upload/t_screenshot_big/7.jpg"]
    );
}

#[tokio::test]
async fn delivered_id_makes_no_request() {
    let (_tmp, stage) = stage();
    let source = MemoryImages::new();
    let delivered: BTreeSet<_> = [ImageId(9)].into_iter().collect();

    let outcome = fetch_image(&source, &image_ref(9), &delivered, &stage, &FetchOptions::default()).await;
    assert_eq!(outcome, FetchOutcome::AlreadyDelivered(ImageId(9)));
    assert_eq!(source.calls(), 0);
    assert!(!stage.path_for(ImageId(9)).exists());
}

#[tokio::test]
async fn download_failure_is_reported() {
    let (_tmp, stage) = stage();
    let source = MemoryImages::new().failing([5]);

    let outcome = fetch_image(&source, &image_ref(5), &BTreeSet::new(), &stage, &FetchOptions::default()).await;
    assert!(matches!(
        outcome,
        FetchOutcome::Failed {
            id: ImageId(5),
            error: FetchError::DownloadFailed(_)
        }
    ));
    assert!(!stage.path_for(ImageId(5)).exists());
}

struct GarbageSource;

impl ImageSource for GarbageSource {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(b"<html>not an image</html>".to_vec())
    }
}

#[tokio::test]
async fn undecodable_bytes_are_decode_failure() {
    let (_tmp, stage) = stage();
    let outcome = fetch_image(
        &GarbageSource,
        &image_ref(3),
        &BTreeSet::new(),
        &stage,
        &FetchOptions::default(),
    )
    .await;
    assert!(matches!(
        outcome,
        FetchOutcome::Failed {
            error: FetchError::DecodeFailed(_),
            ..
        }
    ));
    assert_eq!(outcome.id(), ImageId(3));
}

#[tokio::test]
async fn custom_size_is_honoured() {
    let (_tmp, stage) = stage();
    let options = FetchOptions {
        image_size: 64,
        ..FetchOptions::default()
    };
    fetch_image(&MemoryImages::new(), &image_ref(1), &BTreeSet::new(), &stage, &options).await;

    let staged = image::open(stage.path_for(ImageId(1))).unwrap();
    assert_eq!((staged.width(), staged.height()), (64, 64));
}
