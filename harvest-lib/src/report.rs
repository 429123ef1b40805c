use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use harvest_core::ImageId;

use crate::checkpoint::CheckpointOrigin;

/// Result of one committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// 1-based index within the distribute call.
    pub batch: usize,
    /// Destination, or `None` if nothing was staged and no transfer ran.
    pub target: Option<String>,
    /// Images transferred and newly recorded as delivered.
    pub delivered: usize,
    /// Images that failed to download, decode or stage.
    pub failed: Vec<ImageId>,
    /// Images skipped because they were already delivered.
    pub skipped: usize,
}

/// What a pipeline run did, for the closing report.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub origin: Option<CheckpointOrigin>,
    pub stale_files_removed: usize,
    pub pages: usize,
    /// Entries accumulated at the end of the run.
    pub entries: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Images skipped for reaching the attempt limit.
    pub abandoned: usize,
    pub batches: usize,
    /// Images delivered per target.
    pub targets_used: BTreeMap<String, usize>,
    /// Catalog exhausted and output written.
    pub completed: bool,
}

impl RunSummary {
    pub fn start() -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            origin: None,
            stale_files_removed: 0,
            pages: 0,
            entries: 0,
            delivered: 0,
            failed: 0,
            abandoned: 0,
            batches: 0,
            targets_used: BTreeMap::new(),
            completed: false,
        }
    }

    pub fn record_batch(&mut self, report: &BatchReport) {
        self.batches += 1;
        self.delivered += report.delivered;
        self.failed += report.failed.len();
        if let Some(target) = &report.target {
            *self.targets_used.entry(target.clone()).or_insert(0) += report.delivered;
        }
    }

    pub fn finish(&mut self, entries: usize, completed: bool) {
        self.entries = entries;
        self.completed = completed;
        self.finished_at = Some(Local::now());
    }

    /// Wall-clock time of the run so far.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Local::now) - self.started_at
    }
}
