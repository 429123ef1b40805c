//! Local staging directory holding downloaded images until their batch is
//! transferred.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use harvest_core::ImageId;

/// The staging directory. Each image is written to its own file, so
/// concurrent fetches never touch the same path.
#[derive(Debug, Clone)]
pub struct Stage {
    dir: PathBuf,
}

impl Stage {
    /// Create the directory if needed and remove files left behind by an
    /// interrupted run. Returns the stage and the number of files removed.
    ///
    /// Leftovers were never recorded as delivered; if they stayed they would
    /// ride along with the next transfer.
    pub fn prepare(dir: impl Into<PathBuf>) -> io::Result<(Self, usize)> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut removed = 0;
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            } else {
                log::warn!(
                    "{} is not a regular file; transfers skip it",
                    entry.path().display()
                );
            }
        }
        if removed > 0 {
            log::info!("Removed {} stale staged files from {}", removed, dir.display());
        }
        Ok((Self { dir }, removed))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the staged copy of `id` lives.
    pub fn path_for(&self, id: ImageId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    /// Delete the staged files of `ids`. Missing files are fine.
    pub fn discard(&self, ids: impl IntoIterator<Item = ImageId>) -> io::Result<usize> {
        let mut removed = 0;
        for id in ids {
            match std::fs::remove_file(self.path_for(id)) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }

    /// Remove every staged file whose id is not in `keep`, including files
    /// that do not name an id at all. Returns how many were removed.
    pub fn retain_only(&self, keep: &BTreeSet<ImageId>) -> io::Result<usize> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let id = ImageId::from_file_name(&entry.file_name().to_string_lossy());
            if id.is_some_and(|id| keep.contains(&id)) {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }

    /// Number of regular files currently staged.
    pub fn staged_count(&self) -> io::Result<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            if entry?.file_type()?.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }
}
