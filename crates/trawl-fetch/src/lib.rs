//! HTTP fetch layer for Trawl probes.
//!
//! Provides a shared, cloneable [`FetchClient`] with polite jitter,
//! user-agent rotation, retry with backoff, a HEAD-then-GET helper and an
//! optional remote render fallback for script-gated pages.

pub mod client;
pub mod detector;
pub mod error;
pub mod response;
pub mod retry;
pub mod transport;
pub mod user_agent;

pub use client::{FetchClient, FetchClientBuilder};
pub use detector::{ChallengeDetector, MarkerDetector};
pub use error::{FetchError, Result};
pub use response::{FetchRequest, Method, Response};
pub use retry::RetryPolicy;
pub use transport::{ChallengeAwareTransport, StandardTransport, Transport};
pub use user_agent::UserAgentPool;
