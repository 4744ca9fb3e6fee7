use std::path::Path;

use crate::error::{AuditError, Result};

use super::{EntryStatus, FileSystem};

fn status_of<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<EntryStatus> {
    fs.status(path).map_err(|source| AuditError::FileAccess {
        path: path.to_path_buf(),
        source,
    })
}

fn children_of<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Vec<String>> {
    fs.list_children(path)
        .map_err(|source| AuditError::FileAccess {
            path: path.to_path_buf(),
            source,
        })
}

/// Total recorded size of a file, or of a directory entry plus everything below it.
///
/// Symlinks are not followed: a link contributes its own recorded size.
///
/// # Errors
/// Returns [`AuditError::FileAccess`] if any entry cannot be read.
pub fn aggregate_size<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<u64> {
    let status = status_of(fs, path)?;
    let mut total = status.size;

    if status.is_dir {
        for child in children_of(fs, path)? {
            total += aggregate_size(fs, &path.join(child))?;
        }
    }

    Ok(total)
}

/// Number of immediate children of `dir` that are not directories.
///
/// # Errors
/// Returns [`AuditError::FileAccess`] if the directory or a child cannot be read.
pub fn file_count<F: FileSystem + ?Sized>(fs: &F, dir: &Path) -> Result<usize> {
    let mut total = 0;
    for child in children_of(fs, dir)? {
        if !status_of(fs, &dir.join(child))?.is_dir {
            total += 1;
        }
    }
    Ok(total)
}

#[cfg(test)]
#[path = "size_tests.rs"]
mod tests;
