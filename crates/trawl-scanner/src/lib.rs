//! Trawl Scanner - scan orchestration.
//!
//! Takes one [`Query`](trawl_core::Query) across every registered probe and
//! catalogued site and returns a single ordered list of hits.
//!
//! # Features
//!
//! - Result cache consulted before any network work
//! - Dataset shortcuts that can satisfy a source without its live probe
//! - Bounded concurrent dispatch with a per-probe timeout
//! - Fallback "open site" and "search dork" links for sources that came up empty
//! - Deterministic merge: one contiguous block per source, in priority order
//!
//! # Example
//!
//! ```rust,no_run
//! use trawl_core::{AppConfig, Query};
//! use trawl_scanner::ScanOrchestrator;
//!
//! # async fn run() -> trawl_scanner::Result<()> {
//! let config = AppConfig::default();
//! let orchestrator = ScanOrchestrator::from_config(&config)?;
//!
//! let query = Query::new().with_username("me0w.me0w");
//! let report = orchestrator.run(&query, &config.scan).await?;
//! for hit in &report.hits {
//!     println!("{}: {}", hit.site, hit.url);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod filter;
pub mod orchestrator;
#[allow(missing_docs)]
pub mod outcome;
#[allow(missing_docs)]
pub mod url_builder;

pub use error::{Result, ScanError};
pub use filter::SourceFilter;
pub use orchestrator::ScanOrchestrator;
pub use outcome::{ProbeOutcome, ProbeState, ScanReport, SourceReport};
pub use url_builder::{dork_query, dork_url, fallback_hits, FallbackReason};
