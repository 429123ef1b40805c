/// Errors that can occur while talking to the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token exchange failed: {0}")]
    Auth(String),

    #[error("Catalog query failed (HTTP {status}): {message}")]
    Query { status: u16, message: String },

    #[error("Image download failed (HTTP {status}): {url}")]
    Download { status: u16, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Whether this error means the credentials themselves are unusable.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
            || matches!(self, Self::Query { status, .. } if *status == 401 || *status == 403)
    }
}
