//! Storage targets: the backend abstraction, the rclone implementation, and
//! capacity-aware routing across an ordered list of targets.

pub mod backend;
pub mod capacity;
pub mod error;
pub mod rclone;
pub mod router;

pub use backend::{Capacity, StorageBackend};
pub use capacity::{FreeSpace, probe};
pub use error::StorageError;
pub use rclone::RcloneBackend;
pub use router::{ProbeFailurePolicy, TargetProbe, TargetRouter};
