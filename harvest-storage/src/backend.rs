use std::future::Future;
use std::path::Path;

use crate::error::StorageError;

/// Capacity figures reported by a target. Backends may omit any of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capacity {
    pub total: Option<u64>,
    pub used: Option<u64>,
    pub free: Option<u64>,
}

impl Capacity {
    /// Free bytes, preferring the reported figure over `total - used`.
    ///
    /// `None` means the backend reports no upper bound.
    pub fn free_bytes(&self) -> Option<u64> {
        match (self.free, self.total, self.used) {
            (Some(free), _, _) => Some(free),
            (None, Some(total), used) => Some(total.saturating_sub(used.unwrap_or(0))),
            (None, None, _) => None,
        }
    }
}

/// The three operations the pipeline needs from a remote storage target.
///
/// Targets are addressed by name; how a name maps to a remote is up to the
/// backend.
pub trait StorageBackend: Send + Sync {
    /// Query used/total/free space of `target`.
    fn capacity(&self, target: &str)
    -> impl Future<Output = Result<Capacity, StorageError>> + Send;

    /// Copy every file in `local_dir` to `target`. Existing remote files are kept.
    fn copy_dir(
        &self,
        local_dir: &Path,
        target: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Recursively list file paths stored on `target`.
    fn list(&self, target: &str) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_prefers_reported_value() {
        let cap = Capacity {
            total: Some(100),
            used: Some(10),
            free: Some(50),
        };
        assert_eq!(cap.free_bytes(), Some(50));
    }

    #[test]
    fn free_derived_from_total() {
        let cap = Capacity {
            total: Some(100),
            used: Some(30),
            free: None,
        };
        assert_eq!(cap.free_bytes(), Some(70));

        let overfull = Capacity {
            total: Some(100),
            used: Some(130),
            free: None,
        };
        assert_eq!(overfull.free_bytes(), Some(0));
    }

    #[test]
    fn free_unbounded_without_total() {
        let cap = Capacity {
            total: None,
            used: Some(30),
            free: None,
        };
        assert_eq!(cap.free_bytes(), None);
    }
}
