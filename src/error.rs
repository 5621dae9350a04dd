//! Error types shared by every layer of devsnap.
//!
//! `StorageError` covers the record store and its codecs. `ApiError` is the
//! top-level error returned by use cases, git reconciliation and process
//! execution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the record store, index layer and encryption codec.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid content in {}: {reason}", path.display())]
    SchemaInvalid { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error means "nothing stored under that key".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Top-level error for devsnap operations.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    DuplicateEntity(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not a git repository: {}", .0.display())]
    GitNotRepository(PathBuf),

    #[error("`{command}` failed: {stderr}")]
    GitCommandFailed { command: String, stderr: String },

    #[error("Checkpoint applied with conflicts in: {}", .0.join(", "))]
    GitStashConflict(Vec<String>),

    #[error("Command `{command}` exited with code {exit_code:?}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Command `{command}` timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("Command is empty")]
    EmptyCommand,

    #[error("Execution mode '{0}' is not supported outside its host environment")]
    UnsupportedExecutionMode(String),

    #[error("Prompt failed: {0}")]
    PromptError(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
