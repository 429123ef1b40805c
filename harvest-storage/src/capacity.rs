use crate::backend::StorageBackend;

/// Result of probing a target's free space. Probing never fails; failures
/// become [`FreeSpace::Unknown`] and routing decides what that means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeSpace {
    Bytes(u64),
    /// The backend reports no capacity limit.
    Unlimited,
    /// The probe failed or its output could not be read.
    Unknown,
}

impl FreeSpace {
    /// Whether this is known to be strictly more than `min_free` bytes.
    pub fn exceeds(&self, min_free: u64) -> bool {
        match self {
            Self::Bytes(n) => *n > min_free,
            Self::Unlimited => true,
            Self::Unknown => false,
        }
    }
}

impl std::fmt::Display for FreeSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(n) => write!(f, "{} free", harvest_core::util::format_bytes(*n)),
            Self::Unlimited => write!(f, "unlimited"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Ask `backend` how much room `target` has left.
pub async fn probe<B: StorageBackend>(backend: &B, target: &str) -> FreeSpace {
    match backend.capacity(target).await {
        Ok(cap) => match cap.free_bytes() {
            Some(n) => FreeSpace::Bytes(n),
            None => FreeSpace::Unlimited,
        },
        Err(e) => {
            log::warn!("Capacity probe for '{}' failed: {}", target, e);
            FreeSpace::Unknown
        }
    }
}
