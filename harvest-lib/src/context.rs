//! Run context built once at startup and passed down explicitly.

use harvest_storage::{RcloneBackend, TargetRouter};

use crate::error::HarvestError;
use crate::fetcher::FetchOptions;
use crate::settings::Settings;

/// Everything a run needs that is not a live connection: validated
/// settings and the router derived from them.
#[derive(Debug, Clone)]
pub struct HarvestContext {
    pub settings: Settings,
    pub router: TargetRouter,
}

impl HarvestContext {
    pub fn new(settings: Settings) -> Result<Self, HarvestError> {
        settings.validate()?;
        let router = TargetRouter::new(
            settings.storage.targets.clone(),
            settings.storage.min_free_bytes,
            settings.storage.on_probe_failure,
        );
        Ok(Self { settings, router })
    }

    pub fn targets(&self) -> &[String] {
        self.router.targets()
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            image_size: self.settings.pipeline.image_size,
            size_token: self.settings.catalog.image_size_token.clone(),
        }
    }

    /// The rclone backend described by the storage settings.
    pub fn rclone_backend(&self) -> RcloneBackend {
        RcloneBackend::new(
            self.settings.storage.rclone.clone(),
            self.settings.storage.remote_dir.clone(),
        )
    }
}
