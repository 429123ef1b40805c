use harvest_core::ImageId;
use tokio::sync::mpsc;

/// Progress events emitted by the pipeline, consumed by the CLI.
#[derive(Debug, Clone)]
pub enum HarvestEvent {
    /// An existing checkpoint was loaded.
    CheckpointLoaded { offset: u64, delivered: usize },
    /// No checkpoint; listing storage targets to rebuild one.
    Recovering { targets: usize },
    /// One target listed during recovery.
    TargetScanned { target: String, files: usize },
    /// Recovery finished and a fresh checkpoint was written.
    Recovered { delivered: usize },
    /// Leftover files from an interrupted run were removed from the stage.
    StaleStageCleared { files: usize },
    /// Requesting the catalog page at `offset`.
    PageRequested { offset: u64 },
    /// A page arrived and was filtered.
    PageFetched {
        offset: u64,
        entries: usize,
        pending: usize,
        already_delivered: usize,
        abandoned: usize,
    },
    /// A batch is about to be downloaded.
    BatchStarted {
        batch: usize,
        total_batches: usize,
        items: usize,
    },
    /// One image in the current batch finished, successfully or not.
    ItemFinished { id: ImageId, ok: bool },
    /// One image failed and was dropped from the batch.
    ItemFailed { id: ImageId, reason: String },
    /// A destination was chosen for the batch.
    BatchRouted { batch: usize, target: String },
    /// The batch was transferred and recorded.
    BatchCommitted {
        batch: usize,
        target: Option<String>,
        delivered: usize,
        failed: usize,
    },
    /// The page was fully processed and the offset advanced.
    PageCompleted {
        next_offset: u64,
        entries_total: usize,
        delivered_total: usize,
    },
    /// The catalog is exhausted and the output file was written.
    Done { entries: usize },
}

/// Event sender that ignores a closed receiver.
#[derive(Debug, Clone)]
pub struct EventSink(Option<mpsc::UnboundedSender<HarvestEvent>>);

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<HarvestEvent>) -> Self {
        Self(Some(tx))
    }

    /// A sink that drops every event.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn send(&self, event: HarvestEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}
