use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkshopError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to open progress store: {0}")]
    StoreOpen(String),

    #[error("Lock failed: {0}")]
    LockFailed(String),

    #[error("Answer index {index} is out of range for question {identity} ({available} choices)")]
    Resolution {
        identity: String,
        index: String,
        available: usize,
    },

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validator failed: {0}")]
    Validator(String),

    #[error("Interrupted")]
    Interrupted,
}

impl WorkshopError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Interrupted => 130,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkshopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_names_question_and_range() {
        let err = WorkshopError::Resolution {
            identity: "basics-1".to_string(),
            index: "4".to_string(),
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("basics-1"));
        assert!(msg.contains("4"));
        assert!(msg.contains("3 choices"));
    }

    #[test]
    fn interrupted_uses_sigint_exit_code() {
        assert_eq!(WorkshopError::Interrupted.exit_code(), 130);
        assert_eq!(WorkshopError::Config("x".into()).exit_code(), 1);
    }
}
