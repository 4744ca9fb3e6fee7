//! Filesystem probe: the two recursive helpers used by size and count rules.

mod filesystem;
mod size;

#[cfg(test)]
pub(crate) mod mock_fs;

pub use filesystem::{EntryStatus, FileSystem, RealFileSystem};
pub use size::{aggregate_size, file_count};
