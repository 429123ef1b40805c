use std::path::Path;

use serde::{Deserialize, Serialize};

/// Catalog identifier of a single screenshot.
///
/// This is the idempotency key for delivery tracking: staged files and files
/// on storage targets are named `<id>.<ext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

/// Error returned when a string is not a valid image identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid image id: '{0}'")]
pub struct ImageIdParseError(pub String);

impl ImageId {
    /// Recover an identifier from a stored file name (`"42.jpg"` -> `42`).
    ///
    /// Accepts a path with directories; only the final component is used.
    /// Returns `None` for names whose stem is not a number.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = Path::new(name).file_stem()?.to_str()?;
        stem.parse().ok()
    }

    /// File name used for the staged and stored copy of this image.
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.0)
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ImageId {
    type Err = ImageIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ImageId)
            .map_err(|_| ImageIdParseError(s.to_string()))
    }
}

impl From<u64> for ImageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
#[path = "tests/ids_tests.rs"]
mod tests;
