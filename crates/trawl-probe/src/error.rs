//! Error types for the probe subsystem.

use thiserror::Error;

/// Errors that can occur in probe registration, catalog loading and probing.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// A probe is already registered under this name
    #[error("probe already registered for source: {site}")]
    DuplicateSource {
        /// The source name
        site: String,
    },

    /// No probe is registered under this name
    #[error("no probe registered for source: {site}")]
    NotFound {
        /// The source name
        site: String,
    },

    /// Invalid source name
    #[error("invalid source name: {0}")]
    InvalidName(#[from] trawl_core::TrawlError),

    /// HTTP failure that the probe chose not to absorb
    #[error("fetch failed: {0}")]
    Fetch(#[from] trawl_fetch::FetchError),

    /// Response could not be interpreted
    #[error("failed to parse response for {site}: {reason}")]
    Parse {
        /// The source name
        site: String,
        /// What went wrong
        reason: String,
    },

    /// Failed to parse a site catalog
    #[error("failed to parse site catalog {path}: {error}")]
    CatalogParse {
        /// Where the catalog came from
        path: String,
        /// TOML parse error
        #[source]
        error: toml::de::Error,
    },

    /// Invalid site definition
    #[error("invalid site definition for {site}: {reason}")]
    InvalidSite {
        /// The site name
        site: String,
        /// Reason for validation failure
        reason: String,
    },

    /// I/O error while reading a catalog file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProbeError::DuplicateSource {
            site: "Radaris".to_string(),
        };
        assert_eq!(err.to_string(), "probe already registered for source: Radaris");

        let err = ProbeError::InvalidSite {
            site: "Zillow".to_string(),
            reason: "domain must not include a scheme".to_string(),
        };
        assert!(err.to_string().contains("Zillow"));
    }
}
