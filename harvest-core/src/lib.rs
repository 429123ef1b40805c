//! Shared data model for the screenshot harvest pipeline.
//!
//! Everything here is plain data: catalog entries as read from the catalog,
//! the image references they carry, and the checkpoint that records which
//! images have reached storage. No I/O happens in this crate.

pub mod checkpoint;
pub mod entry;
pub mod ids;
pub mod util;

pub use checkpoint::Checkpoint;
pub use entry::{CatalogEntry, ImageRef, extract_image_refs};
pub use ids::{ImageId, ImageIdParseError};

/// Number of catalog entries requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Number of images staged and transferred together.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Concurrent image fetches within one batch.
pub const DEFAULT_WORKERS: usize = 16;

/// Screenshots kept per catalog entry.
pub const DEFAULT_MAX_SCREENSHOTS: usize = 5;

/// Edge length of the normalized square images, in pixels.
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// A target must have strictly more free space than this to receive a batch.
pub const DEFAULT_MIN_FREE_BYTES: u64 = 1_000_000_000;

/// Failed attempts after which an image is no longer retried. 0 disables the limit.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
