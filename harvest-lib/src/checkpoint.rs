//! Checkpoint Store: the durable copy of a run's progress.

use std::io::Write;
use std::path::{Path, PathBuf};

use harvest_core::Checkpoint;
use harvest_storage::StorageBackend;

use crate::error::HarvestError;
use crate::events::{EventSink, HarvestEvent};
use crate::recovery::{RecoveryReport, recover_delivered};

/// Where the checkpoint a run started from came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointOrigin {
    Loaded,
    /// Rebuilt from storage listings; `count` ids were found.
    Recovered { count: usize },
}

/// A checkpoint file on disk.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// The stored checkpoint, or `None` if there is no file.
    ///
    /// A file that exists but does not parse is an error, never treated as
    /// absent: that would throw away the delivered set.
    pub fn try_load(&self) -> Result<Option<Checkpoint>, HarvestError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HarvestError::checkpoint(&self.path, e.to_string())),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| HarvestError::checkpoint(&self.path, e.to_string()))
    }

    /// The stored checkpoint, or an empty one at offset 0.
    pub fn load(&self) -> Result<Checkpoint, HarvestError> {
        Ok(self.try_load()?.unwrap_or_default())
    }

    /// Replace the stored checkpoint. Readers see either the old or the new
    /// file, never a partial one.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), HarvestError> {
        let json = serde_json::to_vec(checkpoint)?;
        write_atomic(&self.path, &json)
    }

    /// Delete the stored checkpoint. A missing file is not an error.
    pub fn clear(&self) -> Result<(), HarvestError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the checkpoint; without one, rebuild the delivered set from
    /// storage and persist it before returning.
    pub async fn load_or_recover<B: StorageBackend>(
        &self,
        backend: &B,
        targets: &[String],
        events: &EventSink,
    ) -> Result<(Checkpoint, CheckpointOrigin), HarvestError> {
        if let Some(checkpoint) = self.try_load()? {
            log::info!(
                "Loaded checkpoint {} (offset {}, {} delivered)",
                self.path.display(),
                checkpoint.offset,
                checkpoint.delivered.len()
            );
            events.send(HarvestEvent::CheckpointLoaded {
                offset: checkpoint.offset,
                delivered: checkpoint.delivered.len(),
            });
            return Ok((checkpoint, CheckpointOrigin::Loaded));
        }

        log::info!("No checkpoint at {}, scanning storage", self.path.display());
        let report = recover_delivered(backend, targets, events).await?;
        let checkpoint = Checkpoint::with_delivered(report.delivered);
        self.save(&checkpoint)?;

        let count = checkpoint.delivered.len();
        events.send(HarvestEvent::Recovered { delivered: count });
        Ok((checkpoint, CheckpointOrigin::Recovered { count }))
    }

    /// Scan storage even if a checkpoint exists and merge the ids found into
    /// it. Offset and entries of an existing checkpoint are kept.
    pub async fn rebuild<B: StorageBackend>(
        &self,
        backend: &B,
        targets: &[String],
        events: &EventSink,
    ) -> Result<(Checkpoint, RecoveryReport), HarvestError> {
        let mut checkpoint = self.load()?;
        let report = recover_delivered(backend, targets, events).await?;
        let added = checkpoint.mark_delivered(report.delivered.iter().copied());
        self.save(&checkpoint)?;

        log::info!("Rebuilt checkpoint: {} ids found, {} new", report.delivered.len(), added);
        events.send(HarvestEvent::Recovered {
            delivered: checkpoint.delivered.len(),
        });
        Ok((checkpoint, report))
    }
}

/// Write `bytes` to a sibling temp file, fsync it, then rename over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/checkpoint_tests.rs"]
mod tests;
