//! Error types for record storage.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving the instances document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Data file does not exist.
    #[error("data file not found: {path}")]
    NotFound { path: PathBuf },

    /// Data file exists but cannot be parsed.
    #[error("corrupt data file at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The pre-write backup failed. The primary document was left untouched.
    #[error("backup write failed at {path}: {source}")]
    BackupWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error during file operations.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error serializing the collection.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a corrupt-data error with path context.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a backup-write error with path context.
    pub fn backup_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::BackupWrite {
            path: path.into(),
            source,
        }
    }
}

/// Convenience type alias for storage results.
pub type StoreResult<T> = Result<T, StoreError>;
