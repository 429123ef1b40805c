use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entry::CatalogEntry;
use crate::ids::ImageId;

/// Durable progress of a harvest run.
///
/// Invariants maintained by the pipeline:
/// - `offset` only moves forward, one full page at a time.
/// - every id in `delivered` has a file on some storage target.
/// - `attempts` never holds a delivered id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Images already present on a storage target.
    #[serde(default, alias = "downloaded")]
    pub delivered: BTreeSet<ImageId>,
    /// Catalog offset of the next page to request.
    #[serde(default)]
    pub offset: u64,
    /// Entries collected so far, written to the output file at the end.
    #[serde(default, rename = "games")]
    pub entries: Vec<CatalogEntry>,
    /// Failed download attempts per image that has not been delivered yet.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attempts: BTreeMap<ImageId, u32>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already known delivered set, at offset 0.
    pub fn with_delivered(delivered: impl IntoIterator<Item = ImageId>) -> Self {
        Self {
            delivered: delivered.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn is_delivered(&self, id: ImageId) -> bool {
        self.delivered.contains(&id)
    }

    /// Record a committed batch: `ids` are on storage now.
    pub fn mark_delivered(&mut self, ids: impl IntoIterator<Item = ImageId>) -> usize {
        let mut added = 0;
        for id in ids {
            self.attempts.remove(&id);
            if self.delivered.insert(id) {
                added += 1;
            }
        }
        added
    }

    /// Count one more failed attempt for each id.
    pub fn record_failures(&mut self, ids: impl IntoIterator<Item = ImageId>) {
        for id in ids {
            if !self.delivered.contains(&id) {
                *self.attempts.entry(id).or_insert(0) += 1;
            }
        }
    }

    pub fn attempts(&self, id: ImageId) -> u32 {
        self.attempts.get(&id).copied().unwrap_or(0)
    }

    /// True once `id` has failed `max_attempts` times. `0` means never.
    pub fn is_abandoned(&self, id: ImageId, max_attempts: u32) -> bool {
        max_attempts > 0 && self.attempts(id) >= max_attempts
    }

    /// Move past the page that started at the current offset.
    pub fn advance(&mut self, page_size: u32) {
        self.offset += u64::from(page_size);
    }
}

#[cfg(test)]
#[path = "tests/checkpoint_tests.rs"]
mod tests;
