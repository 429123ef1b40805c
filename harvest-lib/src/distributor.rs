//! Batch Distributor: fetch a batch concurrently, route it, transfer it,
//! and only then record it.

use std::collections::BTreeSet;
use std::sync::Arc;

use harvest_core::{Checkpoint, ImageId, ImageRef};
use harvest_storage::{StorageBackend, TargetRouter};

use crate::checkpoint::CheckpointStore;
use crate::error::HarvestError;
use crate::events::{EventSink, HarvestEvent};
use crate::fetcher::{FetchOptions, FetchOutcome, ImageSource, fetch_image};
use crate::report::BatchReport;
use crate::stage::Stage;
use crate::worker_pool::WorkerPool;

pub struct BatchDistributor<S, B> {
    source: Arc<S>,
    backend: Arc<B>,
    router: TargetRouter,
    stage: Arc<Stage>,
    options: Arc<FetchOptions>,
    batch_size: usize,
    workers: usize,
    events: EventSink,
}

impl<S, B> BatchDistributor<S, B>
where
    S: ImageSource + 'static,
    B: StorageBackend,
{
    pub fn new(
        source: Arc<S>,
        backend: Arc<B>,
        router: TargetRouter,
        stage: Stage,
        options: FetchOptions,
    ) -> Self {
        Self {
            source,
            backend,
            router,
            stage: Arc::new(stage),
            options: Arc::new(options),
            batch_size: harvest_core::DEFAULT_BATCH_SIZE,
            workers: harvest_core::DEFAULT_WORKERS,
            events: EventSink::none(),
        }
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n.max(1);
        self
    }

    pub fn events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Deliver `images` batch by batch, saving `checkpoint` after each one.
    ///
    /// Returns at the first routing or transfer failure. Batches committed
    /// before it stay recorded; the failing batch leaves no trace in the
    /// checkpoint and its staged files are removed.
    pub async fn distribute(
        &self,
        images: Vec<ImageRef>,
        checkpoint: &mut Checkpoint,
        store: &CheckpointStore,
    ) -> Result<Vec<BatchReport>, HarvestError> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let delivered = Arc::new(checkpoint.delivered.clone());
        let total_batches = images.len().div_ceil(self.batch_size);
        let mut reports = Vec::with_capacity(total_batches);

        let mut rest = images;
        let mut batch_no = 0;
        while !rest.is_empty() {
            let tail = rest.split_off(rest.len().min(self.batch_size));
            let batch = std::mem::replace(&mut rest, tail);
            batch_no += 1;

            let report = self
                .run_batch(batch_no, total_batches, batch, &delivered, checkpoint, store)
                .await?;
            reports.push(report);
        }
        Ok(reports)
    }

    async fn run_batch(
        &self,
        batch_no: usize,
        total_batches: usize,
        batch: Vec<ImageRef>,
        delivered: &Arc<BTreeSet<ImageId>>,
        checkpoint: &mut Checkpoint,
        store: &CheckpointStore,
    ) -> Result<BatchReport, HarvestError> {
        self.events.send(HarvestEvent::BatchStarted {
            batch: batch_no,
            total_batches,
            items: batch.len(),
        });
        let batch_ids: Vec<ImageId> = batch.iter().map(|i| i.id).collect();

        let source = self.source.clone();
        let stage = self.stage.clone();
        let options = self.options.clone();
        let snapshot = delivered.clone();
        let mut pool = WorkerPool::start(self.workers, batch, move |image: ImageRef| {
            let source = source.clone();
            let stage = stage.clone();
            let options = options.clone();
            let delivered = snapshot.clone();
            async move { fetch_image(&*source, &image, &delivered, &stage, &options).await }
        });

        let mut staged = BTreeSet::new();
        let mut skipped = BTreeSet::new();
        while let Some(outcome) = pool.recv().await {
            match outcome {
                FetchOutcome::Staged(id) => {
                    staged.insert(id);
                    self.events.send(HarvestEvent::ItemFinished { id, ok: true });
                }
                FetchOutcome::AlreadyDelivered(id) => {
                    skipped.insert(id);
                    self.events.send(HarvestEvent::ItemFinished { id, ok: true });
                }
                FetchOutcome::Failed { id, error } => {
                    log::debug!("Image {} failed: {}", id, error);
                    self.events.send(HarvestEvent::ItemFailed {
                        id,
                        reason: error.to_string(),
                    });
                    self.events.send(HarvestEvent::ItemFinished { id, ok: false });
                }
            }
        }

        // Anything without a success result failed, timeouts included.
        let failed: Vec<ImageId> = batch_ids
            .iter()
            .copied()
            .filter(|id| !staged.contains(id) && !skipped.contains(id))
            .collect();

        let target = if staged.is_empty() {
            None
        } else {
            Some(self.transfer(batch_no, &batch_ids, &staged).await?)
        };

        let newly = checkpoint.mark_delivered(staged.iter().copied());
        checkpoint.record_failures(failed.iter().copied());
        self.discard_quietly(&batch_ids);
        store.save(checkpoint)?;

        log::info!(
            "Batch {}/{}: {} delivered to {}, {} failed",
            batch_no,
            total_batches,
            newly,
            target.as_deref().unwrap_or("-"),
            failed.len()
        );
        self.events.send(HarvestEvent::BatchCommitted {
            batch: batch_no,
            target: target.clone(),
            delivered: newly,
            failed: failed.len(),
        });

        Ok(BatchReport {
            batch: batch_no,
            target,
            delivered: newly,
            failed,
            skipped: skipped.len(),
        })
    }

    /// Route the staged batch and copy it. Only the files of `staged` go out.
    /// On failure the staged files are removed before the error is returned.
    async fn transfer(
        &self,
        batch_no: usize,
        batch_ids: &[ImageId],
        staged: &BTreeSet<ImageId>,
    ) -> Result<String, HarvestError> {
        // A fetch the pool gave up on can still finish writing its file.
        match self.stage.retain_only(staged) {
            Ok(0) => {}
            Ok(n) => log::warn!("Removed {} unrecorded files from stage before batch {}", n, batch_no),
            Err(e) => {
                self.discard_quietly(batch_ids);
                return Err(e.into());
            }
        }

        let target = match self.router.select(&*self.backend).await {
            Ok(t) => t,
            Err(e) => {
                self.discard_quietly(batch_ids);
                return Err(e.into());
            }
        };
        self.events.send(HarvestEvent::BatchRouted {
            batch: batch_no,
            target: target.clone(),
        });

        if let Err(source) = self.backend.copy_dir(self.stage.dir(), &target).await {
            self.discard_quietly(batch_ids);
            return Err(HarvestError::Transfer { target, source });
        }
        Ok(target)
    }

    /// Unlink the batch's staged files. A failure here only costs disk space,
    /// so it is logged and the run goes on.
    fn discard_quietly(&self, batch_ids: &[ImageId]) {
        if let Err(e) = self.stage.discard(batch_ids.iter().copied()) {
            log::warn!("Could not clear stage {}: {}", self.stage.dir().display(), e);
        }
    }
}

#[cfg(test)]
#[path = "tests/distributor_tests.rs"]
mod tests;
