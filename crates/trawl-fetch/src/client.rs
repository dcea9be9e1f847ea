use crate::detector::{ChallengeDetector, MarkerDetector};
use crate::error::{FetchError, Result};
use crate::response::{FetchRequest, Method, Response};
use crate::retry::{polite_delay, RetryPolicy};
use crate::transport::{ChallengeAwareTransport, StandardTransport, Transport};
use crate::user_agent::UserAgentPool;
use std::sync::Arc;
use std::time::Duration;
use trawl_core::FetchConfig;

/// Minimum length of an accepted rendered copy.
const MIN_RENDERED_LEN: usize = 80;

/// Shared HTTP client used by every probe and dataset shortcut.
///
/// Each request gets a polite random delay and a rotated user agent.
/// Transient failures (transport errors, 429, 5xx) are retried with jittered
/// exponential backoff. Cloning is cheap.
#[derive(Clone)]
pub struct FetchClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: FetchConfig,
    transport: Arc<dyn Transport>,
    detector: Arc<dyn ChallengeDetector>,
    agents: UserAgentPool,
    retry: RetryPolicy,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("transport", &self.inner.transport.name())
            .field("retries", &self.inner.retry.retries)
            .field("remote_render", &self.inner.config.remote_render_enabled)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FetchClient`] when the transport or detector must be swapped.
pub struct FetchClientBuilder {
    config: FetchConfig,
    transport: Option<Arc<dyn Transport>>,
    detector: Option<Arc<dyn ChallengeDetector>>,
}

impl FetchClientBuilder {
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn detector(mut self, detector: Arc<dyn ChallengeDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn build(self) -> Result<FetchClient> {
        let detector = self
            .detector
            .unwrap_or_else(|| Arc::new(MarkerDetector::new(self.config.min_body_len)));

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None if self.config.challenge_transport => {
                Arc::new(ChallengeAwareTransport::new(Arc::clone(&detector))?)
            }
            None => Arc::new(StandardTransport::new()?),
        };

        tracing::debug!(
            transport = transport.name(),
            retries = self.config.retries,
            remote_render = self.config.remote_render_enabled,
            "fetch client ready"
        );

        Ok(FetchClient {
            inner: Arc::new(Inner {
                agents: UserAgentPool::from_config(&self.config),
                retry: RetryPolicy::from_config(&self.config),
                config: self.config,
                transport,
                detector,
            }),
        })
    }
}

impl FetchClient {
    /// Create a client, choosing the transport from `challenge_transport`.
    pub fn new(config: FetchConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    #[must_use]
    pub fn builder(config: FetchConfig) -> FetchClientBuilder {
        FetchClientBuilder {
            config,
            transport: None,
            detector: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.inner.config
    }

    /// Name of the transport in use.
    #[must_use]
    pub fn transport_name(&self) -> &'static str {
        self.inner.transport.name()
    }

    /// GET a URL. `timeout` defaults to the configured request timeout.
    ///
    /// HTTP error statuses are returned, not raised. When the remote render
    /// fallback is enabled and the body looks gated, the body is replaced by
    /// the rendered copy if one can be obtained.
    pub async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<Response> {
        self.get_with_headers(url, &[], timeout).await
    }

    /// GET with extra request headers.
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let resp = self.dispatch(Method::Get, url, headers, timeout).await?;
        Ok(self.render_if_gated(url, resp).await)
    }

    /// HEAD a URL, falling back to GET when HEAD is refused (405/403) or
    /// succeeds without a body. Redirects are followed.
    pub async fn head_or_get(&self, url: &str, timeout: Option<Duration>) -> Result<Response> {
        let head = self.dispatch(Method::Head, url, &[], timeout).await?;
        let needs_get = matches!(head.status, 403 | 405) || (!head.is_error() && head.text.is_empty());
        if !needs_get {
            return Ok(head);
        }
        tracing::trace!(url = %url, status = head.status, "HEAD insufficient, retrying as GET");
        self.get(url, timeout).await
    }

    /// Fetch a server-rendered copy of `url` from the render endpoint.
    ///
    /// Returns `None` when rendering is disabled, the request fails, the
    /// status is 400 or above, or the body is 80 characters or fewer.
    pub async fn maybe_rendered_copy(&self, url: &str) -> Option<String> {
        let config = &self.inner.config;
        if !config.remote_render_enabled {
            return None;
        }

        let render_url = render_url(&config.render_endpoint, url);
        let request = FetchRequest::new(Method::Get, &render_url, config.timeout())
            .header("user-agent", self.inner.agents.next());

        match self.inner.transport.execute(&request).await {
            Ok(resp) if resp.status < 400 && resp.text.chars().count() > MIN_RENDERED_LEN => {
                tracing::debug!(url = %url, "using rendered copy");
                Some(resp.text)
            }
            Ok(resp) => {
                tracing::debug!(url = %url, status = resp.status, "rendered copy rejected");
                None
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "remote render failed");
                None
            }
        }
    }

    async fn render_if_gated(&self, url: &str, mut resp: Response) -> Response {
        if !self.inner.config.remote_render_enabled
            || !self.inner.detector.is_challenge(resp.status, &resp.text)
        {
            return resp;
        }
        if let Some(rendered) = self.maybe_rendered_copy(url).await {
            resp.text = rendered;
            resp.rendered = true;
        }
        resp
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<Response> {
        url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let config = &self.inner.config;
        let timeout = timeout.unwrap_or_else(|| config.timeout());
        let retry = self.inner.retry;
        let mut attempt: u32 = 0;

        loop {
            let delay = polite_delay(config.jitter_min_ms, config.jitter_max_ms);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let mut request = FetchRequest::new(method, url, timeout);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            request = request.header("user-agent", self.inner.agents.next());

            let can_retry = attempt < retry.retries;
            match self.inner.transport.execute(&request).await {
                Ok(resp) if resp.is_retryable_status() && can_retry => {
                    tracing::info!(url = %url, status = resp.status, attempt, "retrying after HTTP status");
                }
                Ok(resp) => {
                    log_http(method, url, &resp);
                    return Ok(resp);
                }
                Err(e) if e.is_transient() && can_retry => {
                    tracing::info!(url = %url, error = %e, attempt, "retrying after transport error");
                }
                Err(e) => {
                    tracing::warn!(url = %url, method = %method, error = %e, "request failed");
                    return Err(e);
                }
            }

            tokio::time::sleep(retry.backoff(attempt)).await;
            attempt += 1;
        }
    }
}

/// `<endpoint>http://<url without scheme>`.
fn render_url(endpoint: &str, url: &str) -> String {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    format!("{endpoint}http://{stripped}")
}

fn log_http(method: Method, url: &str, resp: &Response) {
    if resp.status < 400 {
        return;
    }
    let body = resp.snippet(200);
    if resp.status < 500 {
        tracing::debug!(url = %url, method = %method, status = resp.status, body = %body, "HTTP client error");
    } else {
        tracing::info!(url = %url, method = %method, status = resp.status, body = %body, "HTTP server error");
    }
}
