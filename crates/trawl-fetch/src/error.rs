use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Failures of a single fetch. HTTP error statuses are not errors; they come
/// back as a [`Response`](crate::Response) with that status.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl FetchError {
    /// Map a `reqwest` error for the given URL.
    pub(crate) fn from_reqwest(url: &str, timeout: Duration, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else if err.is_builder() {
            Self::InvalidUrl {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            Self::Body {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Whether retrying the same request might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Request { .. } | Self::Body { .. }
        )
    }

    /// URL the failing request targeted, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::Timeout { url, .. }
            | Self::Request { url, .. }
            | Self::Body { url, .. } => Some(url),
            Self::ClientBuild(_) => None,
        }
    }
}
