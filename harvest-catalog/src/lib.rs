pub mod client;
pub mod credentials;
pub mod error;
pub mod query;
pub mod types;
pub mod url;

pub use client::IgdbClient;
pub use credentials::{
    CredentialSource, CredentialSources, Credentials, config_path, credential_sources,
    save_to_file,
};
pub use error::CatalogError;
pub use query::CatalogQuery;
pub use types::{GameRecord, ScreenshotRecord};
pub use url::{DEFAULT_SIZE_TOKEN, normalize_image_url};
