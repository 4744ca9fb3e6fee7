#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Creates an `assert_cmd` Command for the audit-fs binary.
#[macro_export]
macro_rules! audit_fs {
    () => {
        assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("audit-fs"))
    };
}

/// Creates a temporary directory with test fixtures for integration tests.
pub struct TestFixture {
    pub dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Creates a file with the given content in the temp directory.
    pub fn create_file(&self, relative_path: &str, content: &str) {
        let path = self.dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write file");
    }

    /// Creates a file of exactly `size` bytes.
    pub fn create_sized_file(&self, relative_path: &str, size: usize) {
        self.create_file(relative_path, &"x".repeat(size));
    }

    pub fn create_dir(&self, relative_path: &str) {
        let path = self.dir.path().join(relative_path);
        fs::create_dir_all(&path).expect("Failed to create directory");
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The temp directory as a string, for `--dir` and `Auditor::set`.
    pub fn dir_str(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    /// Writes `.audit-fs.toml` at the fixture root.
    pub fn create_plan(&self, content: &str) {
        self.create_file(".audit-fs.toml", content);
    }

    /// A small site layout: `index.html`, `assets/app.js`, `assets/app.css`.
    pub fn site() -> Self {
        let fixture = Self::new();
        fixture.create_file("index.html", "<html><title>home</title></html>\n");
        fixture.create_sized_file("assets/app.js", 300);
        fixture.create_sized_file("assets/app.css", 200);
        fixture
    }
}
