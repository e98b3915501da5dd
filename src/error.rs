//! Error types for tasklist
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, unknown form)
//! - 4: Operation failed (I/O, corrupt storage, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tasklist CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tasklist operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Form not found: {0}")]
    FormNotFound(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Stored entry '{key}' is corrupt: {source}")]
    CorruptStorage {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_) | Error::InvalidArgument(_) | Error::FormNotFound(_) => {
                exit_codes::USER_ERROR
            }

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::CorruptStorage { .. }
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for machine-readable output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::CorruptStorage { key, .. } => Some(serde_json::json!({ "key": key })),
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            Error::FormNotFound(id) => Some(serde_json::json!({ "form": id })),
            _ => None,
        }
    }
}

/// Result type alias for tasklist operations
pub type Result<T> = std::result::Result<T, Error>;
