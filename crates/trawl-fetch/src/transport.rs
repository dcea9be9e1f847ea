//! Wire-level HTTP transports.
//!
//! The [`FetchClient`](crate::FetchClient) picks one transport at
//! construction. Probes only ever see the client, so which transport is in
//! use is invisible to them.

use crate::detector::ChallengeDetector;
use crate::error::{FetchError, Result};
use crate::response::{FetchRequest, Method, Response};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Executes one HTTP request with no retry logic of its own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &FetchRequest) -> Result<Response>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANG: &str = "en-US,en;q=0.9";

fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANG));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

fn browser_headers() -> HeaderMap {
    let mut headers = base_headers();
    for (name, value) in [
        ("upgrade-insecure-requests", "1"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
    ] {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers
}

/// Send a request on a `reqwest` client and buffer the body.
async fn send(client: &reqwest::Client, request: &FetchRequest) -> Result<Response> {
    let mut builder = match request.method {
        Method::Get => client.get(&request.url),
        Method::Head => client.head(&request.url),
    };
    builder = builder.timeout(request.timeout);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let resp = builder
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(&request.url, request.timeout, &e))?;

    let status = resp.status().as_u16();
    let final_url = resp.url().to_string();
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in resp.headers() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    let text = resp
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(&request.url, request.timeout, &e))?;

    Ok(Response {
        status,
        text,
        headers,
        final_url,
        rendered: false,
    })
}

/// Pooled client with minimal default headers.
#[derive(Debug, Clone)]
pub struct StandardTransport {
    client: reqwest::Client,
}

impl StandardTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(base_headers())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for StandardTransport {
    async fn execute(&self, request: &FetchRequest) -> Result<Response> {
        send(&self.client, request).await
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

/// Cookie-persisting client with a full browser header profile.
///
/// When a GET comes back looking like a challenge page, the request is
/// replayed once after `replay_delay`, carrying whatever cookies the
/// challenge set.
pub struct ChallengeAwareTransport {
    client: reqwest::Client,
    detector: Arc<dyn ChallengeDetector>,
    replay_delay: Duration,
}

impl ChallengeAwareTransport {
    pub fn new(detector: Arc<dyn ChallengeDetector>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(browser_headers())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            detector,
            replay_delay: Duration::from_millis(1200),
        })
    }

    #[must_use]
    pub fn with_replay_delay(mut self, delay: Duration) -> Self {
        self.replay_delay = delay;
        self
    }
}

#[async_trait]
impl Transport for ChallengeAwareTransport {
    async fn execute(&self, request: &FetchRequest) -> Result<Response> {
        let first = send(&self.client, request).await?;
        if request.method != Method::Get || !self.detector.is_challenge(first.status, &first.text) {
            return Ok(first);
        }

        tracing::debug!(url = %request.url, status = first.status, "challenge page, replaying with cookies");
        tokio::time::sleep(self.replay_delay).await;
        match send(&self.client, request).await {
            Ok(second) => Ok(second),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "challenge replay failed");
                Ok(first)
            }
        }
    }

    fn name(&self) -> &'static str {
        "challenge-aware"
    }
}
