//! Storage layer for workshop
//!
//! Passed questions live in a SQLite database under `.workshop/`, guarded by
//! an exclusive advisory lock for the duration of one invocation.

pub mod lock;
pub mod progress;

pub use lock::{StoreLock, StoreOwner};
pub use progress::{ProgressStore, PROGRESS_DIR};
