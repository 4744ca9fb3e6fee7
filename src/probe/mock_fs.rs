use std::collections::BTreeMap;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{EntryStatus, FileSystem};

#[derive(Debug, Clone)]
struct MockEntry {
    status: EntryStatus,
    content: Option<String>,
}

/// In-memory filesystem keyed by normalized absolute paths.
pub struct MockFileSystem {
    entries: BTreeMap<PathBuf, MockEntry>,
    current_dir: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            current_dir: PathBuf::from("/project"),
        }
    }

    fn insert(mut self, path: impl Into<PathBuf>, is_dir: bool, size: u64) -> Self {
        let now = SystemTime::now();
        self.entries.insert(
            normalize_path(&path.into()),
            MockEntry {
                status: EntryStatus {
                    is_dir,
                    size,
                    created: now,
                    modified: now,
                },
                content: None,
            },
        );
        self
    }

    pub fn with_dir(self, path: impl Into<PathBuf>, size: u64) -> Self {
        self.insert(path, true, size)
    }

    pub fn with_file(self, path: impl Into<PathBuf>, size: u64) -> Self {
        self.insert(path, false, size)
    }

    pub fn with_content(self, path: impl Into<PathBuf>, content: &str) -> Self {
        let path = path.into();
        let mut fs = self.insert(path.clone(), false, content.len() as u64);
        if let Some(entry) = fs.entries.get_mut(&normalize_path(&path)) {
            entry.content = Some(content.to_string());
        }
        fs
    }

    pub fn with_times(
        mut self,
        path: impl Into<PathBuf>,
        created: SystemTime,
        modified: SystemTime,
    ) -> Self {
        if let Some(entry) = self.entries.get_mut(&normalize_path(&path.into())) {
            entry.status.created = created;
            entry.status.modified = modified;
        }
        self
    }

    pub fn with_current_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_dir = path.into();
        self
    }

    fn entry(&self, path: &Path) -> std::io::Result<&MockEntry> {
        self.entries
            .get(&normalize_path(path))
            .ok_or_else(|| Error::new(ErrorKind::NotFound, "no such file or directory"))
    }
}

impl FileSystem for MockFileSystem {
    fn status(&self, path: &Path) -> std::io::Result<EntryStatus> {
        self.entry(path).map(|e| e.status)
    }

    fn list_children(&self, path: &Path) -> std::io::Result<Vec<String>> {
        let dir = normalize_path(path);
        if !self.entry(&dir)?.status.is_dir {
            return Err(Error::new(ErrorKind::NotADirectory, "not a directory"));
        }
        Ok(self
            .entries
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect())
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        self.entry(path)?
            .content
            .clone()
            .ok_or_else(|| Error::new(ErrorKind::InvalidData, "no content"))
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.contains_key(&normalize_path(path))
    }

    fn current_dir(&self) -> std::io::Result<PathBuf> {
        Ok(self.current_dir.clone())
    }
}

pub fn normalize_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy().replace('\\', "/");
    let mut components = Vec::new();
    for part in path_str.split('/') {
        match part {
            ".." => {
                components.pop();
            }
            "." | "" => {}
            _ => components.push(part),
        }
    }
    let normalized = if path_str.starts_with('/') {
        format!("/{}", components.join("/"))
    } else {
        components.join("/")
    };
    PathBuf::from(normalized)
}
