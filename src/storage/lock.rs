//! Exclusive advisory lock on the progress directory.
//!
//! The lock file doubles as a record of which process owns the store, so a
//! refused open can say who is holding it.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WorkshopError};

const LOCK_FILENAME: &str = "workshop.lock";

/// Who has a progress store open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOwner {
    pub pid: u32,
    pub hostname: String,
    /// Progress directory the owner opened.
    pub store: PathBuf,
    pub opened_at: DateTime<Utc>,
}

impl StoreOwner {
    fn current(store: &Path) -> Self {
        Self {
            pid: std::process::id(),
            hostname: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
            store: store.to_path_buf(),
            opened_at: Utc::now(),
        }
    }
}

impl fmt::Display for StoreOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pid {} on {} since {}",
            self.pid,
            self.hostname,
            self.opened_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Held for the lifetime of an open progress store; released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Lock `store_dir` without blocking and record this process as owner.
    ///
    /// Returns `Ok(None)` when another process owns the store.
    pub fn try_acquire(store_dir: &Path) -> Result<Option<Self>> {
        let path = store_dir.join(LOCK_FILENAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| WorkshopError::LockFailed(format!("{}: {e}", path.display())))?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                debug!("{} is owned by another process", store_dir.display());
                return Ok(None);
            }
            return Err(WorkshopError::LockFailed(format!("{}: {e}", path.display())));
        }

        let lock = Self { file, path };
        lock.record_owner(&StoreOwner::current(store_dir))?;
        debug!("locked {}", store_dir.display());
        Ok(Some(lock))
    }

    /// Rewrite the owner record through the locked handle.
    fn record_owner(&self, owner: &StoreOwner) -> Result<()> {
        let mut file = &self.file;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        serde_json::to_writer(file, owner)?;
        Ok(())
    }

    /// Owner recorded in `store_dir`, if the record is readable.
    pub fn owner(store_dir: &Path) -> Option<StoreOwner> {
        let raw = std::fs::read_to_string(store_dir.join(LOCK_FILENAME)).ok()?;
        serde_json::from_str(&raw).ok()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("unlocking {}: {e}", self.path.display());
        }
    }
}
