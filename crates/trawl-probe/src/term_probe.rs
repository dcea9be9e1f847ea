//! Generic "fetch candidate URLs and look for the query" probing.

use crate::error::Result;
use crate::probe::Probe;
use async_trait::async_trait;
use trawl_core::{Hit, Query, QueryField};
use trawl_fetch::FetchClient;

/// Form-encode a value the way query strings expect (spaces become `+`).
#[must_use]
pub fn quote_plus(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Fetch each candidate URL and record a hit when the page mentions the query.
///
/// A page counts when any query token occurs in the lowercased body, or the
/// username occurs in its `<title>`. Error statuses and empty bodies are
/// skipped. Per-URL failures are logged and skipped. At most `max_hits`
/// hits are returned.
pub async fn probe_site_for_terms(
    client: &FetchClient,
    site: &str,
    query: &Query,
    urls: &[String],
    max_hits: usize,
) -> Vec<Hit> {
    let tokens = query.tokens();
    if tokens.is_empty() || max_hits == 0 {
        return Vec::new();
    }
    let username = query.normalized().username().map(str::to_string);

    let mut hits = Vec::new();
    for url in urls {
        let resp = match client.get(url, None).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(site = %site, url = %url, error = %e, "probe request failed");
                continue;
            }
        };
        if resp.is_error() || resp.text.trim().is_empty() {
            continue;
        }

        let body = resp.text.to_lowercase();
        let in_body = tokens.iter().any(|token| body.contains(token.as_str()));
        let in_title = username.as_deref().is_some_and(|u| {
            resp.title()
                .is_some_and(|title| title.to_lowercase().contains(u))
        });

        if in_body || in_title {
            let mut hit = Hit::new(site, format!("probe: {url}"), &resp.text, url.as_str())
                .with_flag("probed", true)
                .with_flag("code", resp.status);
            if resp.rendered {
                hit = hit.with_flag("rendered", true);
            }
            hits.push(hit);
            if hits.len() >= max_hits {
                break;
            }
        }
    }

    tracing::debug!(site = %site, count = hits.len(), "term probe finished");
    hits
}

/// Builds candidate URLs for a query; returns nothing when the query lacks
/// the fields the site needs.
pub type UrlBuilder = fn(&Query) -> Vec<String>;

/// A table-driven probe: a URL builder plus a hit cap.
#[derive(Debug, Clone)]
pub struct TermProbe {
    site: String,
    urls: UrlBuilder,
    max_hits: usize,
    requires: Vec<QueryField>,
}

impl TermProbe {
    /// Create a probe for `site`.
    #[must_use]
    pub fn new(site: impl Into<String>, urls: UrlBuilder, max_hits: usize) -> Self {
        Self {
            site: site.into(),
            urls,
            max_hits,
            requires: Vec::new(),
        }
    }

    /// Require at least one of the given fields; without any of them the
    /// probe short-circuits to empty.
    #[must_use]
    pub fn requiring(mut self, fields: &[QueryField]) -> Self {
        self.requires = fields.to_vec();
        self
    }

    /// Source name the probe reports hits under.
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Candidate URLs for a query.
    #[must_use]
    pub fn candidate_urls(&self, query: &Query) -> Vec<String> {
        if !self.requires.is_empty() && !self.requires.iter().any(|f| query.has(*f)) {
            return Vec::new();
        }
        (self.urls)(query)
    }
}

#[async_trait]
impl Probe for TermProbe {
    async fn probe(&self, client: &FetchClient, query: &Query) -> Result<Vec<Hit>> {
        let urls = self.candidate_urls(query);
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        Ok(probe_site_for_terms(client, &self.site, query, &urls, self.max_hits).await)
    }
}
