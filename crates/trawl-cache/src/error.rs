//! Error types for the result cache.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing or clearing cache entries.
///
/// Read failures are not errors: an unreadable entry is a cache miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem failure
    #[error("cache I/O failed for {path}: {error}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: std::io::Error,
    },

    /// Entry could not be serialized
    #[error("failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
