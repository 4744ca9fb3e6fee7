use std::path::{Path, PathBuf};

use crate::error::{AuditError, Result};
use crate::probe::{FileSystem, RealFileSystem};

use super::AuditPlan;

pub const LOCAL_CONFIG_NAME: &str = ".audit-fs.toml";

/// A loaded plan and the file it came from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub plan: AuditPlan,
    pub source: Option<PathBuf>,
}

pub trait ConfigLoader {
    /// Load the plan from the default location.
    ///
    /// # Errors
    /// Returns an error if the plan file exists but cannot be read or parsed.
    fn load(&self) -> Result<LoadResult>;

    /// Load the plan from a specific path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    fn load_from_path(&self, path: &Path) -> Result<LoadResult>;
}

/// Loads audit plans from the filesystem.
///
/// Search order:
/// 1. `.audit-fs.toml` in the current directory
/// 2. An empty plan
#[derive(Debug)]
pub struct FileConfigLoader<F: FileSystem = RealFileSystem> {
    fs: F,
}

impl Default for FileConfigLoader<RealFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl FileConfigLoader<RealFileSystem> {
    #[must_use]
    pub const fn new() -> Self {
        Self { fs: RealFileSystem }
    }
}

impl<F: FileSystem> FileConfigLoader<F> {
    #[must_use]
    pub const fn with_fs(fs: F) -> Self {
        Self { fs }
    }

    fn local_config_path(&self) -> Option<PathBuf> {
        self.fs
            .current_dir()
            .ok()
            .map(|dir| dir.join(LOCAL_CONFIG_NAME))
    }

    fn parse_plan(content: &str) -> Result<AuditPlan> {
        let plan: AuditPlan = toml::from_str(content)?;
        Ok(plan)
    }
}

/// Anchor a relative `dir` at the directory holding the plan file.
fn anchor_dir(plan: &mut AuditPlan, path: &Path) {
    let Some(dir) = plan.dir.as_deref() else {
        return;
    };
    if Path::new(dir).is_absolute() {
        return;
    }
    if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        plan.dir = Some(base.join(dir).to_string_lossy().into_owned());
    }
}

impl<F: FileSystem> ConfigLoader for FileConfigLoader<F> {
    fn load(&self) -> Result<LoadResult> {
        if let Some(path) = self.local_config_path()
            && self.fs.exists(&path)
        {
            return self.load_from_path(&path);
        }
        tracing::debug!("no {LOCAL_CONFIG_NAME} found, using an empty plan");
        Ok(LoadResult {
            plan: AuditPlan::default(),
            source: None,
        })
    }

    fn load_from_path(&self, path: &Path) -> Result<LoadResult> {
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|source| AuditError::FileAccess {
                path: path.to_path_buf(),
                source,
            })?;
        let mut plan = Self::parse_plan(&content)?;
        anchor_dir(&mut plan, path);
        tracing::info!(path = %path.display(), checks = plan.checks.len(), "loaded audit plan");
        Ok(LoadResult {
            plan,
            source: Some(path.to_path_buf()),
        })
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
