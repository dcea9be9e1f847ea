//! Certificate transparency lookup through crt.sh.

use crate::error::{DatasetError, Result};
use crate::shortcut::{DatasetShortcut, DATASET_TIMEOUT};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashSet;
use trawl_core::{Hit, Query};
use trawl_fetch::FetchClient;
use trawl_probe::SiteDefinition;
use url::Url;

/// crt.sh search endpoint.
pub const DEFAULT_CRTSH_ENDPOINT: &str = "https://crt.sh/";

/// Certificates returned per lookup.
pub const MAX_CERTIFICATES: usize = 6;

/// Searches certificates issued under the query's email domain.
#[derive(Debug, Clone)]
pub struct CrtShShortcut {
    endpoint: String,
    limit: usize,
}

impl Default for CrtShShortcut {
    fn default() -> Self {
        Self::new()
    }
}

impl CrtShShortcut {
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_CRTSH_ENDPOINT.to_string(),
            limit: MAX_CERTIFICATES,
        }
    }

    /// Query another crt.sh-compatible endpoint.
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

    fn search_url(&self, domain: &str) -> Result<Url> {
        let pattern = if domain.contains('.') {
            format!("%.{domain}")
        } else {
            domain.to_string()
        };
        Url::parse_with_params(&self.endpoint, &[("q", pattern.as_str()), ("output", "json")])
            .map_err(|e| DatasetError::Endpoint {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })
    }
}

fn first_text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Parse crt.sh JSON records into certificate hits, one per certificate id.
pub fn parse_certificates(body: &str, limit: usize) -> Result<Vec<Hit>> {
    let records: Vec<Map<String, Value>> =
        serde_json::from_str(body).map_err(|e| DatasetError::Parse {
            dataset: "crt.sh".to_string(),
            reason: e.to_string(),
        })?;

    let mut seen = HashSet::new();
    let mut hits = Vec::new();
    for record in records {
        let Some(cert_id) = first_text(&record, &["min_cert_id", "id", "cert_id"]) else {
            continue;
        };
        if !seen.insert(cert_id.clone()) {
            continue;
        }

        let name = first_text(&record, &["common_name", "name_value", "entry"]).unwrap_or_default();
        let issued = first_text(&record, &["not_before", "logged_at"]).unwrap_or_default();
        let name_value = first_text(&record, &["name_value"]).unwrap_or_default();

        let mut hit = Hit::new(
            "crt.sh",
            format!("Certificate: {name}, {issued}"),
            format!("cert id={cert_id} name_value={name_value}"),
            format!("https://crt.sh/?id={cert_id}"),
        );
        hit.raw.extend(record);
        hits.push(hit);

        if hits.len() >= limit {
            break;
        }
    }
    Ok(hits)
}

#[async_trait]
impl DatasetShortcut for CrtShShortcut {
    fn name(&self) -> &'static str {
        "crt.sh"
    }

    async fn lookup(
        &self,
        client: &FetchClient,
        _site: &SiteDefinition,
        query: &Query,
    ) -> Result<Vec<Hit>> {
        let Some(domain) = query.email_domain() else {
            return Ok(Vec::new());
        };

        let url = self.search_url(domain)?;
        let resp = client.get(url.as_str(), Some(DATASET_TIMEOUT)).await?;
        if resp.status != 200 {
            tracing::debug!(domain = %domain, status = resp.status, "crt.sh lookup refused");
            return Ok(Vec::new());
        }
        parse_certificates(&resp.text, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dedupes_by_id() {
        let body = r#"[
            {"min_cert_id": 11, "common_name": "jane@example.org", "name_value": "jane@example.org", "not_before": "2021-01-01"},
            {"id": 11, "name_value": "dup"},
            {"id": 12, "name_value": "mail.example.org", "logged_at": "2022-02-02"},
            {"name_value": "no id"}
        ]"#;
        let hits = parse_certificates(body, 6).expect("parse");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Certificate: jane@example.org, 2021-01-01");
        assert_eq!(hits[0].url, "https://crt.sh/?id=11");
        assert_eq!(hits[1].snippet, "cert id=12 name_value=mail.example.org");
    }

    #[test]
    fn test_parse_respects_limit() {
        let body = r#"[{"id":1},{"id":2},{"id":3}]"#;
        assert_eq!(parse_certificates(body, 2).expect("parse").len(), 2);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_certificates("<html>busy</html>", 6),
            Err(DatasetError::Parse { .. })
        ));
    }

    #[test]
    fn test_search_url_wildcards_domain() {
        let url = CrtShShortcut::new().search_url("example.org").expect("url");
        let q: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(q[0], ("q".to_string(), "%.example.org".to_string()));
    }
}
