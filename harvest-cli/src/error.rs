use harvest_catalog::CatalogError;
use harvest_lib::HarvestError;
use thiserror::Error;

/// Errors that end a CLI command with a non-zero exit status.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// The pipeline stopped; the checkpoint holds the last committed batch
    #[error("{0}")]
    Harvest(#[from] HarvestError),

    /// Credentials are missing or were rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Catalog request outside of a run
    #[error("Catalog error: {0}")]
    Catalog(CatalogError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Runtime creation or async error
    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Config(msg) => Self::Config(msg),
            e if e.is_auth() => Self::Auth(e.to_string()),
            e => Self::Catalog(e),
        }
    }
}

impl CliError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Whether the user should be pointed at credential setup.
    pub(crate) fn needs_credentials(&self) -> bool {
        matches!(self, Self::Auth(_))
            || matches!(self, Self::Config(msg) if msg.contains("client_"))
    }
}
