//! Error types for dataset lookups.

use thiserror::Error;

/// Errors that can occur while querying a public dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// HTTP failure
    #[error("dataset request failed: {0}")]
    Fetch(#[from] trawl_fetch::FetchError),

    /// The endpoint plus parameters did not form a valid URL
    #[error("invalid endpoint {endpoint}: {reason}")]
    Endpoint {
        /// The configured endpoint
        endpoint: String,
        /// Parser message
        reason: String,
    },

    /// The dataset answered with something unreadable
    #[error("unreadable {dataset} response: {reason}")]
    Parse {
        /// Dataset name
        dataset: String,
        /// What went wrong
        reason: String,
    },
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
