//! Dataset shortcut capability and the per-source shortcut layer.

use crate::crtsh::CrtShShortcut;
use crate::error::Result;
use crate::wayback::WaybackShortcut;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use trawl_core::{Hit, Query};
use trawl_fetch::FetchClient;
use trawl_probe::SiteDefinition;

/// Request timeout for dataset lookups.
pub const DATASET_TIMEOUT: Duration = Duration::from_secs(12);

/// A public dataset that may already hold evidence for a source.
#[async_trait]
pub trait DatasetShortcut: Send + Sync {
    /// Dataset name, recorded in `raw.dataset` on every accepted hit.
    fn name(&self) -> &'static str;

    /// Look the query up for one catalog site.
    async fn lookup(
        &self,
        client: &FetchClient,
        site: &SiteDefinition,
        query: &Query,
    ) -> Result<Vec<Hit>>;
}

/// Shortcuts bound to source names.
///
/// A source with a bound shortcut is first looked up in the datasets; if
/// any relevant hit comes back, the live probe is skipped.
#[derive(Clone, Default)]
pub struct ShortcutLayer {
    bindings: HashMap<String, Vec<Arc<dyn DatasetShortcut>>>,
}

impl ShortcutLayer {
    /// A layer with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard bindings: archive snapshots for `Wayback`, certificate
    /// transparency for the email tools.
    #[must_use]
    pub fn standard() -> Self {
        let wayback: Arc<dyn DatasetShortcut> = Arc::new(WaybackShortcut::new());
        let crtsh: Arc<dyn DatasetShortcut> = Arc::new(CrtShShortcut::new());

        let mut layer = Self::new();
        layer.bind("Wayback", wayback);
        layer.bind("Hunter.io", Arc::clone(&crtsh));
        layer.bind("EmailHippo", crtsh);
        layer
    }

    /// Bind a shortcut to a source. A source may have several.
    pub fn bind(&mut self, source: impl Into<String>, shortcut: Arc<dyn DatasetShortcut>) {
        self.bindings.entry(source.into()).or_default().push(shortcut);
    }

    /// Whether any shortcut is bound to the source.
    #[must_use]
    pub fn is_bound(&self, source: &str) -> bool {
        self.bindings.contains_key(source)
    }

    /// Sources with bindings, sorted.
    #[must_use]
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        sources.sort_unstable();
        sources
    }

    /// Try to satisfy `site` from its bound datasets.
    ///
    /// Returns `None` when the query has no tokens, nothing is bound, or no
    /// relevant hit came back. Only hits mentioning a query token are kept;
    /// they are relabelled to the source and tagged with `raw.dataset`.
    /// Dataset failures are logged and never surface.
    pub async fn lookup(
        &self,
        client: &FetchClient,
        site: &SiteDefinition,
        query: &Query,
    ) -> Option<Vec<Hit>> {
        let shortcuts = self.bindings.get(&site.name)?;
        let tokens = query.tokens();
        if tokens.is_empty() {
            return None;
        }

        let mut accepted = Vec::new();
        for shortcut in shortcuts {
            let hits = match shortcut.lookup(client, site, query).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::debug!(site = %site.name, dataset = shortcut.name(), error = %e, "dataset lookup failed");
                    continue;
                }
            };

            for hit in hits {
                if !mentions_any(&hit, &tokens) {
                    tracing::trace!(site = %site.name, url = %hit.url, "dataset hit does not mention the query");
                    continue;
                }
                accepted.push(
                    Hit {
                        site: site.name.clone(),
                        ..hit
                    }
                    .with_flag("dataset", shortcut.name()),
                );
            }
        }

        if accepted.is_empty() {
            return None;
        }
        tracing::debug!(site = %site.name, count = accepted.len(), "source satisfied by datasets");
        Some(accepted)
    }
}

fn mentions_any(hit: &Hit, tokens: &[String]) -> bool {
    let raw = serde_json::to_string(&hit.raw).unwrap_or_default();
    let combined = format!("{} {} {} {raw}", hit.title, hit.snippet, hit.url).to_lowercase();
    tokens.iter().any(|token| combined.contains(token.as_str()))
}

impl fmt::Debug for ShortcutLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutLayer")
            .field("sources", &self.sources())
            .finish()
    }
}
