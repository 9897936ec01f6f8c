use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Isolated workshop root with helpers for writing challenge definitions.
pub struct WorkshopFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl WorkshopFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create a file with content, creating parent directories.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Create a `q.yaml` definition in `dir`.
    pub fn create_question(&self, dir: &str, yaml: &str) -> PathBuf {
        self.create_file(&format!("{dir}/q.yaml"), yaml)
    }
}

impl Default for WorkshopFixture {
    fn default() -> Self {
        Self::new()
    }
}
