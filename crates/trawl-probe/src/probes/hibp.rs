//! HaveIBeenPwned breached-account lookup.

use crate::error::Result;
use crate::probe::Probe;
use crate::term_probe::quote_plus;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use trawl_core::{Hit, Query};
use trawl_fetch::FetchClient;

/// Source name of the breach probe.
pub const HIBP: &str = "HaveIBeenPwned";

/// Public API root.
pub const DEFAULT_API_BASE: &str = "https://haveibeenpwned.com/api/v3";

#[derive(Debug, Deserialize)]
struct Breach {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Domain", default)]
    domain: Option<String>,
}

/// Looks up breaches for the query's email (or username as account name).
///
/// Needs an API key. Without one, or without an account to look up, the
/// probe returns nothing. The API is rate limited, so every lookup waits
/// `pause` first.
#[derive(Debug, Clone)]
pub struct HibpProbe {
    api_key: Option<String>,
    api_base: String,
    pause: Duration,
    max_breaches: usize,
}

impl HibpProbe {
    /// Create the probe with the given key.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            api_base: DEFAULT_API_BASE.to_string(),
            pause: Duration::from_millis(1700),
            max_breaches: 10,
        }
    }

    /// Point the probe at another API root.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    #[must_use]
    pub fn with_max_breaches(mut self, max_breaches: usize) -> Self {
        self.max_breaches = max_breaches;
        self
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl Probe for HibpProbe {
    async fn probe(&self, client: &FetchClient, query: &Query) -> Result<Vec<Hit>> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("no HaveIBeenPwned API key configured, skipping");
            return Ok(Vec::new());
        };
        let Some(account) = query.email().or_else(|| query.username()) else {
            return Ok(Vec::new());
        };

        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }

        let account = quote_plus(account);
        let url = format!(
            "{}/breachedaccount/{account}?truncateResponse=true",
            self.api_base
        );
        let headers = [("hibp-api-key", api_key), ("accept", "application/json")];

        let resp = match client.get_with_headers(&url, &headers, None).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(error = %e, "HaveIBeenPwned request failed");
                return Ok(Vec::new());
            }
        };
        if resp.status == 404 {
            tracing::debug!("HaveIBeenPwned: no breaches");
            return Ok(Vec::new());
        }
        if resp.is_error() {
            tracing::debug!(status = resp.status, "HaveIBeenPwned error");
            return Ok(Vec::new());
        }
        if resp.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let breaches: Vec<Breach> = match serde_json::from_str(&resp.text) {
            Ok(breaches) => breaches,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable HaveIBeenPwned response");
                return Ok(Vec::new());
            }
        };

        let account_url = format!("https://haveibeenpwned.com/account/{account}");
        let hits = breaches
            .into_iter()
            .take(self.max_breaches)
            .map(|breach| {
                let name = breach
                    .name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "Breach".to_string());
                let domain = breach
                    .domain
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "haveibeenpwned.com".to_string());
                Hit::new(
                    HIBP,
                    format!("HIBP: {name}"),
                    format!("Domain: {domain}"),
                    account_url.as_str(),
                )
                .with_flag("exists", true)
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = hits.len(), "HaveIBeenPwned breaches");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trawl_core::FetchConfig;

    #[test]
    fn test_blank_key_is_no_key() {
        assert!(!HibpProbe::new(Some("   ".to_string())).has_key());
        assert!(!HibpProbe::new(None).has_key());
        assert!(HibpProbe::new(Some("k".to_string())).has_key());
    }

    #[tokio::test]
    async fn test_no_key_returns_empty() {
        let client = FetchClient::new(FetchConfig::default().without_delays()).expect("client");
        let probe = HibpProbe::new(None).with_api_base("http://127.0.0.1:9");
        let hits = probe
            .probe(&client, &Query::new().with_email("a@b.com"))
            .await
            .expect("probe");
        assert!(hits.is_empty());
    }

    #[test]
    fn test_breach_deserialize_tolerates_missing_fields() {
        let breaches: Vec<Breach> =
            serde_json::from_str(r#"[{"Name":"Adobe"},{"Domain":"x.com","Extra":1}]"#)
                .expect("parse");
        assert_eq!(breaches[0].name.as_deref(), Some("Adobe"));
        assert!(breaches[0].domain.is_none());
        assert_eq!(breaches[1].domain.as_deref(), Some("x.com"));
    }
}
