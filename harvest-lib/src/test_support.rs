//! In-memory catalog, image source and storage used by the pipeline tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use harvest_catalog::CatalogError;
use harvest_core::{CatalogEntry, ImageId, ImageRef};
use harvest_storage::{Capacity, StorageBackend, StorageError};
use image::{ImageFormat, Rgb, RgbImage};

use crate::error::FetchError;
use crate::fetcher::ImageSource;
use crate::sources::CatalogSource;

pub const GB: u64 = 1_000_000_000;

/// A small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 6, Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Catalog URL for image `id`, in the thumbnail form the catalog returns.
pub fn thumb_url(id: u64) -> String {
    format!("//images.example.com/igdb/image/upload/t_thumb/{id}.jpg")
}

pub fn image_ref(id: u64) -> ImageRef {
    ImageRef {
        id: ImageId(id),
        url: thumb_url(id),
    }
}

/// Entry `id` with `count` screenshots numbered from `id * 100`.
pub fn entry(id: u64, count: u64) -> CatalogEntry {
    (0..count).fold(CatalogEntry::new(id, format!("Game {id}")), |e, n| {
        let shot = id * 100 + n;
        e.with_screenshot(shot, thumb_url(shot))
    })
}

pub struct MemoryCatalog {
    entries: Vec<CatalogEntry>,
    requested: Mutex<Vec<u64>>,
    fail_at: Option<u64>,
}

impl MemoryCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            requested: Mutex::new(Vec::new()),
            fail_at: None,
        }
    }

    /// Answer the page at `offset` with a server error.
    pub fn failing_at(mut self, offset: u64) -> Self {
        self.fail_at = Some(offset);
        self
    }

    pub fn requested(&self) -> Vec<u64> {
        self.requested.lock().unwrap().clone()
    }
}

impl CatalogSource for MemoryCatalog {
    async fn fetch_page(&self, offset: u64, limit: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.requested.lock().unwrap().push(offset);
        if self.fail_at == Some(offset) {
            return Err(CatalogError::Query {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        Ok(self
            .entries
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Serves the same PNG for every URL except the ids in `failing`.
pub struct MemoryImages {
    png: Vec<u8>,
    failing: BTreeSet<ImageId>,
    pub calls: AtomicUsize,
    pub urls: Mutex<Vec<String>>,
    /// Files written on every fetch, as a late-finishing earlier fetch would.
    pub litter: Mutex<Vec<PathBuf>>,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self {
            png: png_bytes(),
            failing: BTreeSet::new(),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            litter: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.failing.extend(ids.into_iter().map(ImageId));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageSource for MemoryImages {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        for path in self.litter.lock().unwrap().iter() {
            std::fs::write(path, &self.png).unwrap();
        }
        match ImageId::from_file_name(url) {
            Some(id) if self.failing.contains(&id) => {
                Err(FetchError::DownloadFailed(format!("HTTP 404 for {url}")))
            }
            _ => Ok(self.png.clone()),
        }
    }
}

/// Storage targets kept in memory. Copies record the file names found in
/// the staged directory.
pub struct MemoryStorage {
    free: BTreeMap<String, Option<u64>>,
    files: Mutex<BTreeMap<String, BTreeSet<String>>>,
    fail_copy: AtomicBool,
    pub copies: AtomicUsize,
}

impl MemoryStorage {
    pub fn new(targets: &[(&str, Option<u64>)]) -> Self {
        Self {
            free: targets
                .iter()
                .map(|(name, free)| (name.to_string(), *free))
                .collect(),
            files: Mutex::new(BTreeMap::new()),
            fail_copy: AtomicBool::new(false),
            copies: AtomicUsize::new(0),
        }
    }

    pub fn with_files(self, target: &str, names: &[&str]) -> Self {
        self.files
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn fail_copies(&self, fail: bool) {
        self.fail_copy.store(fail, Ordering::SeqCst);
    }

    pub fn files(&self, target: &str) -> BTreeSet<String> {
        self.files
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }
}

impl StorageBackend for MemoryStorage {
    async fn capacity(&self, target: &str) -> Result<Capacity, StorageError> {
        match self.free.get(target) {
            Some(free) => Ok(Capacity {
                total: None,
                used: None,
                free: *free,
            }),
            None => Err(StorageError::malformed("about", target, "unknown target")),
        }
    }

    async fn copy_dir(&self, local_dir: &Path, target: &str) -> Result<(), StorageError> {
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(StorageError::CommandFailed {
                op: "copy",
                target: target.to_string(),
                status: "exit status: 1".to_string(),
                stderr: "connection reset".to_string(),
            });
        }
        self.copies.fetch_add(1, Ordering::SeqCst);
        let names: Vec<String> = std::fs::read_dir(local_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        self.files
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .extend(names);
        Ok(())
    }

    async fn list(&self, target: &str) -> Result<Vec<String>, StorageError> {
        if !self.free.contains_key(target) {
            return Err(StorageError::CommandFailed {
                op: "lsjson",
                target: target.to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Failed to create file system: didn't find section in config file".to_string(),
            });
        }
        Ok(self.files(target).into_iter().collect())
    }
}
