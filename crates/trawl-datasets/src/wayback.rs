//! Wayback Machine CDX snapshot lookup.

use crate::error::{DatasetError, Result};
use crate::shortcut::{DatasetShortcut, DATASET_TIMEOUT};
use async_trait::async_trait;
use serde_json::{Map, Value};
use trawl_core::{Hit, Query};
use trawl_fetch::FetchClient;
use trawl_probe::probes::WaybackProbe;
use trawl_probe::{SiteCategory, SiteDefinition};
use url::Url;

/// CDX search endpoint.
pub const DEFAULT_CDX_ENDPOINT: &str = "http://web.archive.org/cdx/search/cdx";

/// Snapshots returned per lookup.
pub const MAX_SNAPSHOTS: usize = 6;

/// Finds archived snapshots that mention the query.
///
/// For the archive source itself the targets are the query's profile-like
/// URLs. For any other site the target is `<host>/<username>`.
#[derive(Debug, Clone)]
pub struct WaybackShortcut {
    endpoint: String,
    limit: usize,
}

impl Default for WaybackShortcut {
    fn default() -> Self {
        Self::new()
    }
}

impl WaybackShortcut {
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_CDX_ENDPOINT.to_string(),
            limit: MAX_SNAPSHOTS,
        }
    }

    /// Query another CDX endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// URL prefixes to search for a site and query.
    #[must_use]
    pub fn targets(site: &SiteDefinition, query: &Query) -> Vec<String> {
        if site.category == SiteCategory::Dataset {
            return WaybackProbe::targets(query);
        }
        match (site.host(), query.username()) {
            (Some(host), Some(username)) => vec![format!("{host}/{username}")],
            _ => Vec::new(),
        }
    }

    fn cdx_url(&self, target: &str) -> Result<Url> {
        let limit = self.limit.to_string();
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("url", format!("{target}/*").as_str()),
                ("output", "json"),
                ("filter", "statuscode:200"),
                ("limit", limit.as_str()),
                ("from", "1996"),
                ("collapse", "digest"),
            ],
        )
        .map_err(|e| DatasetError::Endpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })
    }
}

/// Parse a CDX response: a JSON array whose first row names the fields,
/// or whitespace-separated lines when the body is not JSON.
#[must_use]
pub fn parse_cdx(body: &str, limit: usize) -> Vec<Hit> {
    match serde_json::from_str::<Vec<Vec<Value>>>(body) {
        Ok(rows) => {
            let Some((fields, records)) = rows.split_first() else {
                return Vec::new();
            };
            let fields: Vec<String> = fields
                .iter()
                .map(|f| f.as_str().unwrap_or_default().to_string())
                .collect();

            records
                .iter()
                .take(limit)
                .filter_map(|row| {
                    let record: Map<String, Value> =
                        fields.iter().cloned().zip(row.iter().cloned()).collect();
                    let timestamp = record.get("timestamp")?.as_str()?.to_string();
                    let original = record.get("original")?.as_str()?.to_string();
                    let mut hit = snapshot_hit(&timestamp, &original);
                    hit.raw.extend(record);
                    Some(hit)
                })
                .collect()
        }
        Err(_) => body
            .lines()
            .filter_map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                (parts.len() >= 3).then(|| snapshot_hit(parts[1], parts[2]).with_flag("line", line))
            })
            .take(limit)
            .collect(),
    }
}

fn snapshot_hit(timestamp: &str, original: &str) -> Hit {
    Hit::new(
        "Wayback",
        format!("Wayback snapshot, {timestamp}"),
        original,
        format!("https://web.archive.org/web/{timestamp}/{original}"),
    )
}

#[async_trait]
impl DatasetShortcut for WaybackShortcut {
    fn name(&self) -> &'static str {
        "wayback-cdx"
    }

    async fn lookup(
        &self,
        client: &FetchClient,
        site: &SiteDefinition,
        query: &Query,
    ) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        for target in Self::targets(site, query) {
            if hits.len() >= self.limit {
                break;
            }
            let url = self.cdx_url(&target)?;
            let resp = client.get(url.as_str(), Some(DATASET_TIMEOUT)).await?;
            if resp.status != 200 {
                tracing::debug!(target = %target, status = resp.status, "CDX lookup refused");
                continue;
            }
            let remaining = self.limit - hits.len();
            hits.extend(parse_cdx(&resp.text, remaining));
        }
        Ok(hits)
    }
}
