//! Trawl Probe - Site catalog, probe capability and probe registry.
//!
//! A probe checks one source for evidence of a query and returns zero or
//! more hits. Probes are registered by source name in an ordered
//! [`ProbeRegistry`]; the [`SiteCatalog`] describes every source the engine
//! knows about, including those without a probe.
//!
//! # Architecture
//!
//! - **Probe** ([`probe`]): The async `Probe` trait and closure adapter
//! - **Registry** ([`registry`]): Ordered, priority-aware probe registry
//! - **Catalog** ([`catalog`]): TOML site definitions used for fallback links
//! - **Term probing** ([`term_probe`]): Shared fetch-and-match helper
//! - **Built-ins** ([`probes`]): Username pack, breach lookup, people search
//!
//! # Example
//!
//! ```rust,no_run
//! use trawl_core::{FetchConfig, ProbeConfig, Query};
//! use trawl_fetch::FetchClient;
//! use trawl_probe::{register_builtin, ProbeRegistry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ProbeRegistry::new();
//! register_builtin(&registry, &ProbeConfig::default(), &[])?;
//!
//! let client = FetchClient::new(FetchConfig::default())?;
//! let entry = registry.get("IDcrawl")?;
//! let hits = entry
//!     .probe
//!     .probe(&client, &Query::new().with_username("jdoe"))
//!     .await?;
//! println!("{} hits", hits.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod catalog;
pub mod error;
pub mod probe;
pub mod probes;
pub mod registry;
pub mod term_probe;

pub use catalog::{SiteCatalog, SiteCategory, SiteDefinition};
pub use error::{ProbeError, Result};
pub use probe::{probe_fn, FnProbe, Probe};
pub use probes::register_builtin;
pub use registry::{ProbeRegistry, RegistryEntry};
pub use term_probe::{probe_site_for_terms, quote_plus, TermProbe, UrlBuilder};
