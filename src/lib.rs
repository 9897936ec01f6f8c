pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod prompt;
pub mod session;
pub mod storage;
pub mod test_utils;
pub mod validate;
pub mod workshop;

pub use error::{Result, WorkshopError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
