//! Error types for destination storage listing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while listing objects at the destination.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The bucket or container does not exist.
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// A container name or prefix tries to escape the storage root.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Filesystem error while walking the destination.
    #[error("I/O error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Backend-specific listing failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }
}
