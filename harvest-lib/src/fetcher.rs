//! Item Fetcher: one image from URL to a normalized file in the stage.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;

use harvest_catalog::normalize_image_url;
use harvest_core::{ImageId, ImageRef};
use image::ImageFormat;
use image::imageops::FilterType;

use crate::error::FetchError;
use crate::stage::Stage;

/// Somewhere image bytes can be downloaded from.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// How fetched images are normalized.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Edge length of the square output, in pixels.
    pub image_size: u32,
    /// Size token substituted into catalog URLs.
    pub size_token: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            image_size: harvest_core::DEFAULT_IMAGE_SIZE,
            size_token: harvest_catalog::DEFAULT_SIZE_TOKEN.to_string(),
        }
    }
}

/// What happened to one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Written to the stage.
    Staged(ImageId),
    /// Skipped without a network call.
    AlreadyDelivered(ImageId),
    Failed { id: ImageId, error: FetchError },
}

impl FetchOutcome {
    pub fn id(&self) -> ImageId {
        match self {
            Self::Staged(id) | Self::AlreadyDelivered(id) => *id,
            Self::Failed { id, .. } => *id,
        }
    }
}

/// Download `image`, normalize it and write it to the stage.
pub async fn fetch_image<S: ImageSource>(
    source: &S,
    image: &ImageRef,
    delivered: &BTreeSet<ImageId>,
    stage: &Stage,
    options: &FetchOptions,
) -> FetchOutcome {
    let id = image.id;
    if delivered.contains(&id) {
        return FetchOutcome::AlreadyDelivered(id);
    }

    let url = normalize_image_url(&image.url, &options.size_token);
    let bytes = match source.fetch(&url).await {
        Ok(b) => b,
        Err(error) => return FetchOutcome::Failed { id, error },
    };

    // Decoding and resizing are CPU-bound; keep them off the async workers.
    let dest = stage.path_for(id);
    let size = options.image_size;
    let written =
        tokio::task::spawn_blocking(move || normalize_to_file(&bytes, size, &dest)).await;

    match written {
        Ok(Ok(())) => FetchOutcome::Staged(id),
        Ok(Err(error)) => FetchOutcome::Failed { id, error },
        Err(e) => FetchOutcome::Failed {
            id,
            error: FetchError::StageFailed(e.to_string()),
        },
    }
}

/// Decode `bytes`, resize to `size`×`size` and save as JPEG at `dest`.
pub fn normalize_to_file(bytes: &[u8], size: u32, dest: &Path) -> Result<(), FetchError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| FetchError::DecodeFailed(e.to_string()))?;
    let resized = decoded.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    resized
        .save_with_format(dest, ImageFormat::Jpeg)
        .map_err(|e| FetchError::StageFailed(e.to_string()))
}

#[cfg(test)]
#[path = "tests/fetcher_tests.rs"]
mod tests;
