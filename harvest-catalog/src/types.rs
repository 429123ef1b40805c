use serde::Deserialize;

use harvest_core::{CatalogEntry, ImageId, ImageRef};

/// OAuth client-credential response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// A game as returned by the `/games` endpoint with `screenshots.*` expanded.
#[derive(Debug, Deserialize, Clone)]
pub struct GameRecord {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_release_date: Option<i64>,
    #[serde(default)]
    pub screenshots: Vec<ScreenshotRecord>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScreenshotRecord {
    pub id: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl GameRecord {
    /// Convert into the pipeline's entry type, keeping at most
    /// `max_screenshots` screenshots that actually carry a URL.
    pub fn into_entry(self, max_screenshots: usize) -> CatalogEntry {
        let screenshots = self
            .screenshots
            .into_iter()
            .filter_map(|s| {
                s.url.map(|url| ImageRef {
                    id: ImageId(s.id),
                    url,
                })
            })
            .take(max_screenshots)
            .collect();

        CatalogEntry {
            id: self.id,
            name: self.name.unwrap_or_default(),
            screenshots,
        }
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
