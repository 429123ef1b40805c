//! Recovery Scanner: rebuild the delivered set from what storage already holds.

use std::collections::{BTreeMap, BTreeSet};

use futures::stream::{self, StreamExt};
use harvest_core::ImageId;
use harvest_storage::StorageBackend;

use crate::error::HarvestError;
use crate::events::{EventSink, HarvestEvent};

/// Targets listed at the same time.
const LIST_CONCURRENCY: usize = 4;

/// What a full inventory scan found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Union of image ids found on all targets.
    pub delivered: BTreeSet<ImageId>,
    /// Number of image files found per target.
    pub per_target: BTreeMap<String, usize>,
    /// Files whose name is not an image id.
    pub skipped_names: Vec<String>,
}

/// List every target and collect the ids of the files stored there.
///
/// A target that cannot be listed fails the whole scan: a partial delivered
/// set would let the next run upload duplicates.
pub async fn recover_delivered<B: StorageBackend>(
    backend: &B,
    targets: &[String],
    events: &EventSink,
) -> Result<RecoveryReport, HarvestError> {
    events.send(HarvestEvent::Recovering {
        targets: targets.len(),
    });

    let listings: Vec<_> = stream::iter(targets)
        .map(|target| async move { (target, backend.list(target).await) })
        .buffered(LIST_CONCURRENCY)
        .collect()
        .await;

    let mut report = RecoveryReport::default();
    for (target, listing) in listings {
        let files = listing?;
        let mut found = 0;
        for name in files {
            match ImageId::from_file_name(&name) {
                Some(id) => {
                    report.delivered.insert(id);
                    found += 1;
                }
                None => report.skipped_names.push(name),
            }
        }
        log::debug!("Recovery: {} images on {}", found, target);
        events.send(HarvestEvent::TargetScanned {
            target: target.clone(),
            files: found,
        });
        report.per_target.insert(target.clone(), found);
    }

    if !report.skipped_names.is_empty() {
        log::warn!(
            "Recovery: ignored {} files without an image id name",
            report.skipped_names.len()
        );
    }
    Ok(report)
}

#[cfg(test)]
#[path = "tests/recovery_tests.rs"]
mod tests;
