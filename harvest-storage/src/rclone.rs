use std::path::Path;

use serde::Deserialize;
use tokio::process::Command;

use crate::backend::{Capacity, StorageBackend};
use crate::error::StorageError;

/// Storage backend that shells out to `rclone`.
///
/// A target name is an rclone remote; files live under `remote_dir` on it,
/// i.e. `<target>:<remote_dir>/`.
#[derive(Debug, Clone)]
pub struct RcloneBackend {
    program: String,
    remote_dir: String,
}

#[derive(Debug, Deserialize)]
struct AboutOutput {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    used: Option<u64>,
    #[serde(default)]
    free: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    #[serde(rename = "Path")]
    path: String,
    #[serde(rename = "IsDir", default)]
    is_dir: bool,
}

impl RcloneBackend {
    pub fn new(program: impl Into<String>, remote_dir: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            remote_dir: remote_dir.into(),
        }
    }

    /// `<target>:<remote_dir>/`, the location files are copied to and listed from.
    pub fn remote_path(&self, target: &str) -> String {
        let dir = self.remote_dir.trim_matches('/');
        if dir.is_empty() {
            format!("{target}:")
        } else {
            format!("{target}:{dir}/")
        }
    }

    async fn run(&self, op: &'static str, target: &str, args: &[&str]) -> Result<Vec<u8>, StorageError> {
        log::debug!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| StorageError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(StorageError::CommandFailed {
                op,
                target: target.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

impl StorageBackend for RcloneBackend {
    async fn capacity(&self, target: &str) -> Result<Capacity, StorageError> {
        let remote = format!("{target}:");
        let stdout = self.run("about", target, &["about", &remote, "--json"]).await?;
        parse_about(target, &stdout)
    }

    async fn copy_dir(&self, local_dir: &Path, target: &str) -> Result<(), StorageError> {
        let local = format!("{}/", local_dir.display());
        let remote = self.remote_path(target);
        self.run("copy", target, &["copy", "--max-depth", "1", &local, &remote])
            .await?;
        Ok(())
    }

    async fn list(&self, target: &str) -> Result<Vec<String>, StorageError> {
        let remote = self.remote_path(target);
        match self
            .run("lsjson", target, &["lsjson", "-R", "--files-only", &remote])
            .await
        {
            Ok(stdout) => parse_listing(target, &stdout),
            Err(e) if is_missing_dir(&e) => {
                log::debug!("{remote} does not exist yet, listing it as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

/// rclone exits with status 3 when the directory it was asked about is absent.
/// A target that never received a batch has no remote dir yet.
fn is_missing_dir(err: &StorageError) -> bool {
    match err {
        StorageError::CommandFailed { status, stderr, .. } => {
            status.ends_with("status: 3") || stderr.contains("directory not found")
        }
        _ => false,
    }
}

fn parse_about(target: &str, stdout: &[u8]) -> Result<Capacity, StorageError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(StorageError::malformed("about", target, "empty output"));
    }
    let about: AboutOutput = serde_json::from_slice(stdout)
        .map_err(|e| StorageError::malformed("about", target, e.to_string()))?;
    Ok(Capacity {
        total: about.total,
        used: about.used,
        free: about.free,
    })
}

fn parse_listing(target: &str, stdout: &[u8]) -> Result<Vec<String>, StorageError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let entries: Vec<ListEntry> = serde_json::from_slice(stdout)
        .map_err(|e| StorageError::malformed("lsjson", target, e.to_string()))?;
    Ok(entries
        .into_iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.path)
        .collect())
}

#[cfg(test)]
#[path = "tests/rclone_tests.rs"]
mod tests;
