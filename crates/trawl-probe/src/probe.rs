//! The probe capability.

use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use trawl_core::{Hit, Query};
use trawl_fetch::FetchClient;

/// Checks one source for evidence of a query.
///
/// A probe returns an empty vector when it has nothing to say, including
/// when the query lacks the fields it needs. Errors are reserved for
/// failures the caller should see; the scanner turns them into fallback
/// links rather than aborting the run.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe the source for `query` using the shared client.
    async fn probe(&self, client: &FetchClient, query: &Query) -> Result<Vec<Hit>>;
}

/// Adapter that lets an async closure act as a [`Probe`].
///
/// The closure receives owned copies of the client (cheap to clone) and the
/// query so the returned future does not borrow from the caller.
pub struct FnProbe<F> {
    f: F,
}

impl<F> FnProbe<F> {
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn(FetchClient, Query) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Hit>>> + Send,
{
    async fn probe(&self, client: &FetchClient, query: &Query) -> Result<Vec<Hit>> {
        (self.f)(client.clone(), query.clone()).await
    }
}

/// Box an async closure as a shareable probe.
pub fn probe_fn<F, Fut>(f: F) -> Arc<dyn Probe>
where
    F: Fn(FetchClient, Query) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Hit>>> + Send + 'static,
{
    Arc::new(FnProbe::new(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trawl_core::FetchConfig;

    #[tokio::test]
    async fn test_closure_probe() {
        let probe = probe_fn(|_client, query: Query| async move {
            Ok(query
                .username()
                .map(|u| vec![Hit::new("Echo", u, "", "https://example.com")])
                .unwrap_or_default())
        });

        let client = FetchClient::new(FetchConfig::default()).expect("client");
        let hits = probe
            .probe(&client, &Query::new().with_username("alice"))
            .await
            .expect("probe");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "alice");

        let none = probe.probe(&client, &Query::new()).await.expect("probe");
        assert!(none.is_empty());
    }
}
