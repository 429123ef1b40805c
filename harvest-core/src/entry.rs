use serde::{Deserialize, Serialize};

use crate::ids::ImageId;

/// A screenshot reference as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: ImageId,
    /// Source URL exactly as the catalog returned it (may be protocol-relative).
    pub url: String,
}

/// One game from the catalog, with at most a handful of screenshots.
///
/// This is also the record written to the final output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub screenshots: Vec<ImageRef>,
}

impl CatalogEntry {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            screenshots: Vec::new(),
        }
    }

    pub fn with_screenshot(mut self, id: u64, url: impl Into<String>) -> Self {
        self.screenshots.push(ImageRef {
            id: ImageId(id),
            url: url.into(),
        });
        self
    }

    pub fn has_screenshots(&self) -> bool {
        !self.screenshots.is_empty()
    }

    /// Keep only the first `max` screenshots.
    pub fn truncated(mut self, max: usize) -> Self {
        self.screenshots.truncate(max);
        self
    }
}

/// Flatten a page of entries into the image references to process.
///
/// Entries without screenshots contribute nothing; each entry contributes at
/// most `max_per_entry` references, in catalog order.
pub fn extract_image_refs(entries: &[CatalogEntry], max_per_entry: usize) -> Vec<ImageRef> {
    entries
        .iter()
        .flat_map(|e| e.screenshots.iter().take(max_per_entry))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(id: u64, shots: u64) -> CatalogEntry {
        (0..shots).fold(CatalogEntry::new(id, format!("Game {id}")), |e, i| {
            e.with_screenshot(id * 100 + i, format!("//images.example/t_thumb/{i}.jpg"))
        })
    }

    #[test]
    fn extraction_skips_empty_and_truncates() {
        let entries = vec![entry_with(1, 0), entry_with(2, 6)];
        let refs = extract_image_refs(&entries, 5);
        assert_eq!(refs.len(), 5);
        assert!(refs.iter().all(|r| r.id.0 / 100 == 2));
        assert_eq!(refs[0].id, ImageId(200));
        assert_eq!(refs[4].id, ImageId(204));
    }

    #[test]
    fn output_shape() {
        let entry = entry_with(7, 1);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Game 7");
        assert_eq!(json["screenshots"][0]["id"], 700);
        assert_eq!(json["screenshots"][0]["url"], "//images.example/t_thumb/0.jpg");
    }

    #[test]
    fn truncated_keeps_order() {
        let entry = entry_with(3, 6).truncated(2);
        let ids: Vec<_> = entry.screenshots.iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![300, 301]);
    }
}
