//! The harvest pipeline: fetch catalog pages, download and normalize
//! screenshots, distribute them across storage targets and checkpoint
//! progress after every batch.

pub mod async_util;
pub mod checkpoint;
pub mod context;
pub mod distributor;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod pipeline;
pub mod recovery;
pub mod report;
pub mod settings;
pub mod sources;
pub mod stage;
pub mod worker_pool;

#[cfg(test)]
pub(crate) mod test_support;

pub use async_util::run_with_events;
pub use checkpoint::{CheckpointOrigin, CheckpointStore};
pub use context::HarvestContext;
pub use distributor::BatchDistributor;
pub use error::{FetchError, HarvestError};
pub use events::{EventSink, HarvestEvent};
pub use fetcher::{FetchOptions, FetchOutcome, ImageSource, fetch_image};
pub use pipeline::{Pipeline, write_output};
pub use recovery::{RecoveryReport, recover_delivered};
pub use report::{BatchReport, RunSummary};
pub use settings::{
    CatalogSettings, PathSettings, PipelineSettings, Settings, StorageSettings, settings_path,
};
pub use sources::{CatalogSource, IgdbCatalog};
pub use stage::Stage;
