use thiserror::Error;
use trawl_core::ConfigError;

/// Errors that stop a scan from starting.
///
/// Per-source failures never appear here; they are absorbed into fallback
/// hits and reported through [`crate::ProbeOutcome`].
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid scan configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("query has no username, name, email or phone")]
    EmptyQuery,

    #[error("failed to build fetch client: {0}")]
    Fetch(#[from] trawl_fetch::FetchError),

    #[error("failed to register probes: {0}")]
    Probe(#[from] trawl_probe::ProbeError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
