//! Pipeline Driver: page through the catalog until it is exhausted.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use harvest_core::{CatalogEntry, Checkpoint, ImageRef, extract_image_refs};
use harvest_storage::StorageBackend;

use crate::checkpoint::{CheckpointStore, write_atomic};
use crate::context::HarvestContext;
use crate::distributor::BatchDistributor;
use crate::error::HarvestError;
use crate::events::{EventSink, HarvestEvent};
use crate::fetcher::ImageSource;
use crate::report::RunSummary;
use crate::sources::CatalogSource;
use crate::stage::Stage;

/// A page split into the images still to deliver and the counts of those
/// left out.
#[derive(Debug, Default)]
pub(crate) struct PagePlan {
    pub pending: Vec<ImageRef>,
    pub already_delivered: usize,
    pub abandoned: usize,
}

/// Pick the images of `entries` that still need delivering. Duplicate ids
/// within the page are kept once.
pub(crate) fn plan_page(
    entries: &[CatalogEntry],
    checkpoint: &Checkpoint,
    max_screenshots: usize,
    max_attempts: u32,
) -> PagePlan {
    let mut plan = PagePlan::default();
    let mut seen = BTreeSet::new();
    for image in extract_image_refs(entries, max_screenshots) {
        if !seen.insert(image.id) {
            continue;
        }
        if checkpoint.is_delivered(image.id) {
            plan.already_delivered += 1;
        } else if checkpoint.is_abandoned(image.id, max_attempts) {
            plan.abandoned += 1;
        } else {
            plan.pending.push(image);
        }
    }
    plan
}

/// The harvest state machine, wired to its catalog, image source and
/// storage backend.
pub struct Pipeline<C, S, B> {
    context: HarvestContext,
    catalog: C,
    source: Arc<S>,
    backend: Arc<B>,
    events: EventSink,
}

impl<C, S, B> Pipeline<C, S, B>
where
    C: CatalogSource,
    S: ImageSource + 'static,
    B: StorageBackend,
{
    pub fn new(context: HarvestContext, catalog: C, source: Arc<S>, backend: Arc<B>) -> Self {
        Self {
            context,
            catalog,
            source,
            backend,
            events: EventSink::none(),
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn checkpoint_store(&self) -> CheckpointStore {
        CheckpointStore::new(&self.context.settings.paths.checkpoint)
    }

    /// Run until the catalog is exhausted or a fatal error occurs.
    ///
    /// On success the output file holds every accumulated entry and the
    /// checkpoint is gone. On error the checkpoint reflects the last
    /// committed batch. The event sink is dropped with the pipeline when
    /// the run returns.
    pub async fn run(self) -> Result<RunSummary, HarvestError> {
        let settings = &self.context.settings;
        let pipeline = &settings.pipeline;
        let mut summary = RunSummary::start();

        let store = self.checkpoint_store();
        let (mut checkpoint, origin) = store
            .load_or_recover(&*self.backend, self.context.targets(), &self.events)
            .await?;
        summary.origin = Some(origin);

        let (stage, removed) = Stage::prepare(&settings.paths.stage_dir)?;
        summary.stale_files_removed = removed;
        if removed > 0 {
            self.events.send(HarvestEvent::StaleStageCleared { files: removed });
        }

        let distributor = BatchDistributor::new(
            self.source.clone(),
            self.backend.clone(),
            self.context.router.clone(),
            stage,
            self.context.fetch_options(),
        )
        .batch_size(pipeline.batch_size)
        .workers(pipeline.workers)
        .events(self.events.clone());

        loop {
            let offset = checkpoint.offset;
            self.events.send(HarvestEvent::PageRequested { offset });
            log::debug!("Requesting page at offset {}", offset);
            let entries = self.catalog.fetch_page(offset, pipeline.page_size).await?;

            if entries.is_empty() {
                write_output(&settings.paths.output, &checkpoint.entries)?;
                store.clear()?;
                log::info!(
                    "Catalog exhausted at offset {}; wrote {} entries to {}",
                    offset,
                    checkpoint.entries.len(),
                    settings.paths.output.display()
                );
                self.events.send(HarvestEvent::Done {
                    entries: checkpoint.entries.len(),
                });
                summary.finish(checkpoint.entries.len(), true);
                return Ok(summary);
            }

            let plan = plan_page(
                &entries,
                &checkpoint,
                pipeline.max_screenshots,
                pipeline.max_attempts,
            );
            self.events.send(HarvestEvent::PageFetched {
                offset,
                entries: entries.len(),
                pending: plan.pending.len(),
                already_delivered: plan.already_delivered,
                abandoned: plan.abandoned,
            });
            summary.abandoned += plan.abandoned;

            let reports = distributor
                .distribute(plan.pending, &mut checkpoint, &store)
                .await?;
            for report in &reports {
                summary.record_batch(report);
            }

            // Entries join the checkpoint with the offset move, so a resumed
            // page never adds them twice.
            checkpoint.entries.extend(
                entries
                    .into_iter()
                    .filter(CatalogEntry::has_screenshots)
                    .map(|e| e.truncated(pipeline.max_screenshots)),
            );
            checkpoint.advance(pipeline.page_size);
            store.save(&checkpoint)?;
            summary.pages += 1;

            self.events.send(HarvestEvent::PageCompleted {
                next_offset: checkpoint.offset,
                entries_total: checkpoint.entries.len(),
                delivered_total: checkpoint.delivered.len(),
            });
        }
    }
}

/// Write the final entry list as a JSON array, atomically.
pub fn write_output(path: &Path, entries: &[CatalogEntry]) -> Result<(), HarvestError> {
    let json = serde_json::to_vec_pretty(entries)?;
    write_atomic(path, &json)
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
