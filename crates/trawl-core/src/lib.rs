//! Trawl Core - Foundation crate for the Trawl identity probing engine.
//!
//! This crate provides the shared data model, error handling, configuration
//! and logging setup that every other Trawl crate depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with platform paths and env overrides
//! - [`types`] - The `Query` / `Hit` data model and the `SourceName` newtype
//! - [`engine`] - Search engines used for fallback dork links
//! - [`logging`] - `tracing` subscriber initialisation
//!
//! # Example
//!
//! ```rust
//! use trawl_core::{AppConfig, Query};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.scan.validate()?;
//!
//! let query = Query::new().with_username("  Me0w.Me0w ");
//! assert_eq!(query.normalized().username(), Some("me0w.me0w"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, CacheConfig, FetchConfig, ProbeConfig, ScanConfig, UaRotation};
pub use engine::SearchEngine;
pub use error::{ConfigError, ConfigResult, Result, TrawlError};
pub use types::{truncate_snippet, Hit, Query, QueryField, SourceName, SNIPPET_MAX_CHARS};
