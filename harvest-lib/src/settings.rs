//! Settings file: `~/.config/harvest/settings.toml`.
//!
//! Every key is optional; missing keys take the defaults below. The CLI
//! overrides individual fields after loading.

use std::path::{Path, PathBuf};

use harvest_storage::ProbeFailurePolicy;
use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

/// Canonical path to the settings file.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("harvest").join("settings.toml")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pipeline: PipelineSettings,
    pub storage: StorageSettings,
    pub catalog: CatalogSettings,
    pub paths: PathSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub page_size: u32,
    pub batch_size: usize,
    pub workers: usize,
    pub max_screenshots: usize,
    /// Failed attempts before an image is given up on; 0 retries forever.
    pub max_attempts: u32,
    pub image_size: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            page_size: harvest_core::DEFAULT_PAGE_SIZE,
            batch_size: harvest_core::DEFAULT_BATCH_SIZE,
            workers: harvest_core::DEFAULT_WORKERS,
            max_screenshots: harvest_core::DEFAULT_MAX_SCREENSHOTS,
            max_attempts: harvest_core::DEFAULT_MAX_ATTEMPTS,
            image_size: harvest_core::DEFAULT_IMAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Targets in routing priority order.
    pub targets: Vec<String>,
    pub remote_dir: String,
    pub min_free_bytes: u64,
    pub on_probe_failure: ProbeFailurePolicy,
    /// rclone executable.
    pub rclone: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            targets: (1..=12).map(|i| format!("drive{i}")).collect(),
            remote_dir: "screenshots".to_string(),
            min_free_bytes: harvest_core::DEFAULT_MIN_FREE_BYTES,
            on_probe_failure: ProbeFailurePolicy::default(),
            rclone: "rclone".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub filter: String,
    /// Replaces the thumbnail size token in screenshot URLs.
    pub image_size_token: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            filter: harvest_catalog::query::DEFAULT_FILTER.to_string(),
            image_size_token: harvest_catalog::DEFAULT_SIZE_TOKEN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub stage_dir: PathBuf,
    pub checkpoint: PathBuf,
    pub output: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            stage_dir: PathBuf::from("screenshots"),
            checkpoint: PathBuf::from("checkpoint.json"),
            output: PathBuf::from("game_screenshots.json"),
        }
    }
}

impl Settings {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, HarvestError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&contents)
            .map_err(|e| HarvestError::config(format!("{}: {}", path.display(), e)))
    }

    /// Write to `path` atomically, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), HarvestError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = toml::to_string_pretty(self)
            .map_err(|e| HarvestError::config(format!("Failed to serialize settings: {e}")))?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.pipeline.page_size == 0 {
            return Err(HarvestError::config("page_size must be positive"));
        }
        if self.pipeline.batch_size == 0 {
            return Err(HarvestError::config("batch_size must be positive"));
        }
        if self.pipeline.workers == 0 {
            return Err(HarvestError::config("workers must be positive"));
        }
        if self.pipeline.image_size == 0 {
            return Err(HarvestError::config("image_size must be positive"));
        }
        if self.storage.targets.is_empty() {
            return Err(HarvestError::config("at least one storage target is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
