//! Durable record of passed question identities.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::{Result, WorkshopError};
use crate::storage::lock::StoreLock;

/// Directory created under the workshop root to hold progress.
pub const PROGRESS_DIR: &str = ".workshop";

const DB_FILENAME: &str = "progress.db";

const MIGRATIONS: [&str; 1] = ["CREATE TABLE IF NOT EXISTS passed (
        identity  TEXT PRIMARY KEY NOT NULL,
        passed_at TEXT NOT NULL
    );"];

pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

/// Append-only set of passed identities backed by SQLite.
///
/// Exclusively owned by one process: opening takes an advisory lock that is
/// released when the store is closed or dropped.
pub struct ProgressStore {
    conn: Connection,
    dir: PathBuf,
    _lock: StoreLock,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    /// Open (creating if absent) the store under `workshop_root/.workshop`.
    ///
    /// # Errors
    ///
    /// Every failure is reported as [`WorkshopError::StoreOpen`].
    pub fn open(workshop_root: &Path) -> Result<Self> {
        Self::open_dir(&workshop_root.join(PROGRESS_DIR))
    }

    /// Open the store in an explicit directory.
    pub fn open_dir(dir: &Path) -> Result<Self> {
        Self::open_inner(dir).map_err(|err| match err {
            WorkshopError::StoreOpen(_) => err,
            other => WorkshopError::StoreOpen(format!("{}: {other}", dir.display())),
        })
    }

    fn open_inner(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let lock = StoreLock::try_acquire(dir)?.ok_or_else(|| {
            let owner = StoreLock::owner(dir)
                .map(|owner| format!(" ({owner})"))
                .unwrap_or_default();
            WorkshopError::StoreOpen(format!(
                "{} is in use by another workshop process{owner}",
                dir.display()
            ))
        })?;

        let conn = Connection::open(dir.join(DB_FILENAME))?;
        Self::configure_pragmas(&conn)?;
        run_migrations(&conn)?;

        debug!("Opened progress store at {}", dir.display());
        Ok(Self {
            conn,
            dir: dir.to_path_buf(),
            _lock: lock,
        })
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA temp_store = MEMORY;",
        )?;
        Ok(())
    }

    /// Directory backing this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full scan of every passed identity.
    pub fn passed_identities(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT identity FROM passed")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut passed = HashSet::new();
        for row in rows {
            passed.insert(row?);
        }
        Ok(passed)
    }

    pub fn contains(&self, identity: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM passed WHERE identity = ?",
            [identity],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record a pass. Durable once this returns; re-recording is a no-op.
    pub fn mark_passed(&self, identity: &str) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO passed (identity, passed_at) VALUES (?, ?)",
            params![identity, Utc::now().to_rfc3339()],
        )?;
        if inserted > 0 {
            info!("recorded pass for {identity}");
        }
        Ok(())
    }

    /// Close the connection and release the lock.
    pub fn close(self) -> Result<()> {
        let Self { conn, dir, _lock } = self;
        conn.close().map_err(|(_, err)| WorkshopError::Database(err))?;
        debug!("Closed progress store at {}", dir.display());
        Ok(())
    }
}

fn run_migrations(conn: &Connection) -> Result<u32> {
    let current_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let target_version = (idx + 1) as u32;
        if current_version >= target_version {
            continue;
        }
        conn.execute_batch(sql).map_err(|err| {
            WorkshopError::StoreOpen(format!("migration {target_version} failed: {err}"))
        })?;
        conn.pragma_update(None, "user_version", target_version)?;
    }

    Ok(SCHEMA_VERSION)
}
