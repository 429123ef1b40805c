use serde::{Deserialize, Serialize};

use crate::backend::StorageBackend;
use crate::capacity::{FreeSpace, probe};
use crate::error::StorageError;

/// What routing does with a target whose capacity probe failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeFailurePolicy {
    /// Treat the target as having unlimited room.
    #[default]
    AssumeUnlimited,
    /// Skip the target for this batch.
    Skip,
}

impl std::str::FromStr for ProbeFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assume-unlimited" | "unlimited" | "optimistic" => Ok(Self::AssumeUnlimited),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown probe failure policy: '{other}'")),
        }
    }
}

impl std::fmt::Display for ProbeFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssumeUnlimited => write!(f, "assume-unlimited"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Probe outcome for one target, as reported by [`TargetRouter::probe_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProbe {
    pub target: String,
    pub free: FreeSpace,
    pub eligible: bool,
}

/// First-fit routing over a fixed, ordered list of targets.
#[derive(Debug, Clone)]
pub struct TargetRouter {
    targets: Vec<String>,
    min_free_bytes: u64,
    on_probe_failure: ProbeFailurePolicy,
}

impl TargetRouter {
    pub fn new(targets: Vec<String>, min_free_bytes: u64, on_probe_failure: ProbeFailurePolicy) -> Self {
        Self {
            targets,
            min_free_bytes,
            on_probe_failure,
        }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    fn is_eligible(&self, free: FreeSpace) -> bool {
        match free {
            FreeSpace::Unknown => self.on_probe_failure == ProbeFailurePolicy::AssumeUnlimited,
            other => other.exceeds(self.min_free_bytes),
        }
    }

    /// Return the first target with more than the minimum free space.
    ///
    /// Targets are probed in list order and probing stops at the first match.
    pub async fn select<B: StorageBackend>(&self, backend: &B) -> Result<String, StorageError> {
        for target in &self.targets {
            let free = probe(backend, target).await;
            if self.is_eligible(free) {
                log::debug!("Routing to '{}' ({})", target, free);
                return Ok(target.clone());
            }
            log::info!("Target '{}' not eligible ({})", target, free);
        }
        Err(StorageError::AllTargetsFull {
            tried: self.targets.len(),
        })
    }

    /// Probe every target without stopping, for status display.
    pub async fn probe_all<B: StorageBackend>(&self, backend: &B) -> Vec<TargetProbe> {
        let mut probes = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let free = probe(backend, target).await;
            probes.push(TargetProbe {
                target: target.clone(),
                free,
                eligible: self.is_eligible(free),
            });
        }
        probes
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
