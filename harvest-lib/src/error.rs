use std::path::PathBuf;

use harvest_catalog::CatalogError;
use harvest_storage::StorageError;
use thiserror::Error;

/// Fatal errors that end a harvest run. The last saved checkpoint stays on
/// disk so the next run resumes from it.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The catalog rejected a page request or could not be reached
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// No storage target has room for the current batch
    #[error("All storage targets are full ({tried} checked)")]
    AllTargetsFull { tried: usize },

    /// Bulk transfer of a batch failed; nothing from the batch was recorded
    #[error("Transfer to '{target}' failed: {source}")]
    Transfer {
        target: String,
        #[source]
        source: StorageError,
    },

    /// Listing or probing storage failed outside of a transfer
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// The checkpoint file exists but cannot be used
    #[error("Checkpoint {}: {message}", path.display())]
    Checkpoint { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid settings or arguments
    #[error("Config error: {0}")]
    Config(String),
}

impl From<StorageError> for HarvestError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::AllTargetsFull { tried } => Self::AllTargetsFull { tried },
            other => Self::Storage(other),
        }
    }
}

impl HarvestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn checkpoint(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Checkpoint {
            path: path.into(),
            message: msg.into(),
        }
    }
}

/// Per-image failures. These never end a run: the image is left out of the
/// batch and stays eligible for the next run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("staging failed: {0}")]
    StageFailed(String),
}
