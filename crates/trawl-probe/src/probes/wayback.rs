//! Live Wayback Machine availability probe.

use crate::error::Result;
use crate::probe::Probe;
use crate::term_probe::quote_plus;
use async_trait::async_trait;
use serde::Deserialize;
use trawl_core::{Hit, Query};
use trawl_fetch::FetchClient;

/// Source name of the archive probe.
pub const WAYBACK: &str = "Wayback";

/// Availability API endpoint.
pub const DEFAULT_AVAILABILITY_API: &str = "https://archive.org/wayback/available";

#[derive(Debug, Default, Deserialize)]
struct Availability {
    #[serde(default)]
    archived_snapshots: Snapshots,
}

#[derive(Debug, Default, Deserialize)]
struct Snapshots {
    closest: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    available: bool,
    url: String,
    #[serde(default)]
    timestamp: String,
}

/// Asks the archive for the closest snapshot of the query's profile-like URLs.
#[derive(Debug, Clone)]
pub struct WaybackProbe {
    api: String,
    max_hits: usize,
}

impl Default for WaybackProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl WaybackProbe {
    #[must_use]
    pub fn new() -> Self {
        Self {
            api: DEFAULT_AVAILABILITY_API.to_string(),
            max_hits: 4,
        }
    }

    /// Use another availability endpoint.
    #[must_use]
    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    #[must_use]
    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = max_hits;
        self
    }

    /// URLs worth looking up for a query.
    #[must_use]
    pub fn targets(query: &Query) -> Vec<String> {
        let mut targets = Vec::new();
        if let Some(u) = query.username() {
            targets.push(format!("github.com/{u}"));
            targets.push(format!("twitter.com/{u}"));
            targets.push(format!("instagram.com/{u}"));
            targets.push(format!("reddit.com/user/{u}"));
        }
        if let Some(domain) = query.email_domain() {
            targets.push(domain.to_string());
        }
        targets
    }
}

#[async_trait]
impl Probe for WaybackProbe {
    async fn probe(&self, client: &FetchClient, query: &Query) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        for target in Self::targets(query) {
            let url = format!("{}?url={}", self.api, quote_plus(&target));
            let resp = match client.get(&url, None).await {
                Ok(resp) if !resp.is_error() => resp,
                Ok(resp) => {
                    tracing::debug!(target = %target, status = resp.status, "availability lookup refused");
                    continue;
                }
                Err(e) => {
                    tracing::debug!(target = %target, error = %e, "availability lookup failed");
                    continue;
                }
            };

            let availability: Availability = match serde_json::from_str(&resp.text) {
                Ok(availability) => availability,
                Err(e) => {
                    tracing::debug!(target = %target, error = %e, "unreadable availability response");
                    continue;
                }
            };
            let Some(snapshot) = availability
                .archived_snapshots
                .closest
                .filter(|s| s.available)
            else {
                continue;
            };

            hits.push(
                Hit::new(
                    WAYBACK,
                    format!("Wayback snapshot, {}", snapshot.timestamp),
                    format!("Archived copy of {target}"),
                    snapshot.url,
                )
                .with_flag("exists", true)
                .with_flag("timestamp", snapshot.timestamp),
            );
            if hits.len() >= self.max_hits {
                break;
            }
        }
        Ok(hits)
    }
}
