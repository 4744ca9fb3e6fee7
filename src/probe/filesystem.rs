//! Filesystem abstraction for testability.
//!
//! Provides a trait for the status and listing calls the probe and the config
//! loader need, so both can be driven by an in-memory mock in tests.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Status of a single filesystem entry, as reported without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStatus {
    pub is_dir: bool,
    pub size: u64,
    /// Status-change time on Unix, creation time elsewhere.
    pub created: SystemTime,
    pub modified: SystemTime,
}

/// Trait for filesystem operations (for testability).
pub trait FileSystem {
    /// Status of `path` without following a trailing symlink (lstat).
    ///
    /// # Errors
    /// Returns an error if the path does not exist or cannot be read.
    fn status(&self, path: &Path) -> std::io::Result<EntryStatus>;

    /// Names of the immediate children of a directory, in a stable order.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read.
    fn list_children(&self, path: &Path) -> std::io::Result<Vec<String>>;

    /// Read file contents as a string.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Get the current working directory.
    ///
    /// # Errors
    /// Returns an error if the current directory cannot be determined.
    fn current_dir(&self) -> std::io::Result<PathBuf>;
}

/// Real filesystem implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn status(&self, path: &Path) -> std::io::Result<EntryStatus> {
        let meta = std::fs::symlink_metadata(path)?;
        Ok(EntryStatus {
            is_dir: meta.is_dir(),
            size: meta.len(),
            created: status_change_time(&meta),
            modified: meta.modified()?,
        })
    }

    fn list_children(&self, path: &Path) -> std::io::Result<Vec<String>> {
        let mut names = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn current_dir(&self) -> std::io::Result<PathBuf> {
        std::env::current_dir()
    }
}

#[cfg(unix)]
fn status_change_time(meta: &Metadata) -> SystemTime {
    use std::os::unix::fs::MetadataExt;
    use std::time::Duration;

    let secs = u64::try_from(meta.ctime()).unwrap_or(0);
    let nanos = u32::try_from(meta.ctime_nsec()).unwrap_or(0);
    UNIX_EPOCH + Duration::new(secs, nanos)
}

#[cfg(not(unix))]
fn status_change_time(meta: &Metadata) -> SystemTime {
    meta.created()
        .or_else(|_| meta.modified())
        .unwrap_or(UNIX_EPOCH)
}
