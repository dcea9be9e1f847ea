//! Scan orchestrator.
//!
//! A run goes cache → shortcuts → bounded probe dispatch → fallbacks →
//! merge → cache. Per-source failures never fail the run.

use crate::error::{Result, ScanError};
use crate::filter::SourceFilter;
use crate::outcome::{ProbeOutcome, ProbeState, ScanReport, SourceReport};
use crate::url_builder::{fallback_hits, FallbackReason};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::borrow::Cow;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};
use trawl_cache::ResultCache;
use trawl_core::{AppConfig, Hit, Query, ScanConfig};
use trawl_datasets::ShortcutLayer;
use trawl_fetch::FetchClient;
use trawl_probe::{
    register_builtin, Probe, ProbeRegistry, SiteCatalog, SiteCategory, SiteDefinition,
};
use uuid::Uuid;

/// A source selected for this run.
struct PlannedSource {
    name: String,
    site: Option<SiteDefinition>,
    probe: Option<Arc<dyn Probe>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Shortcut,
    Probed,
    Unregistered,
}

struct Resolved {
    outcome: ProbeOutcome,
    route: Route,
    elapsed: Duration,
}

/// Runs queries across every selected source and merges the results.
///
/// Cloning is cheap; the registry, catalog and shortcut layer are shared.
#[derive(Clone)]
pub struct ScanOrchestrator {
    registry: ProbeRegistry,
    catalog: Arc<SiteCatalog>,
    client: FetchClient,
    shortcuts: Arc<ShortcutLayer>,
    cache: ResultCache,
    filter: SourceFilter,
}

impl ScanOrchestrator {
    /// Create an orchestrator over an already populated registry.
    #[must_use]
    pub fn new(
        registry: ProbeRegistry,
        catalog: SiteCatalog,
        client: FetchClient,
        shortcuts: ShortcutLayer,
        cache: ResultCache,
    ) -> Self {
        Self {
            registry,
            catalog: Arc::new(catalog),
            client,
            shortcuts: Arc::new(shortcuts),
            cache,
            filter: SourceFilter::All,
        }
    }

    /// Build the standard orchestrator: builtin probes, builtin catalog,
    /// standard dataset bindings and the configured cache directory.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let registry = ProbeRegistry::new();
        register_builtin(&registry, &config.probes, &config.scan.priority_sources)?;
        let client = FetchClient::new(config.fetch.clone())?;
        let cache = ResultCache::new(config.cache.resolve_dir()?);

        Ok(Self::new(
            registry,
            SiteCatalog::builtin(),
            client,
            ShortcutLayer::standard(),
            cache,
        ))
    }

    /// Restrict runs to the sources matching `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: SourceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Probes this orchestrator dispatches.
    #[must_use]
    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Catalog used for home URLs, domains and catalog-only sources.
    #[must_use]
    pub fn catalog(&self) -> &SiteCatalog {
        &self.catalog
    }

    /// The result cache.
    #[must_use]
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Run a scan and return only the merged hits.
    pub async fn run_hits(&self, query: &Query, config: &ScanConfig) -> Result<Vec<Hit>> {
        Ok(self.run(query, config).await?.into_hits())
    }

    /// Run a scan.
    ///
    /// Fails only for an invalid configuration or an empty query. Every
    /// selected source contributes one contiguous block of hits, in
    /// priority-then-registration order, whatever order the probes finish in.
    pub async fn run(&self, query: &Query, config: &ScanConfig) -> Result<ScanReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("scan", %run_id);
        self.run_inner(run_id, query, config).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, query: &Query, config: &ScanConfig) -> Result<ScanReport> {
        config.validate()?;
        if query.is_empty() {
            return Err(ScanError::EmptyQuery);
        }
        let started = Instant::now();

        if config.bypass_cache {
            if let Err(e) = self.cache.clear(query).await {
                warn!(error = %e, "failed to clear cached results");
            }
        } else if let Some(hits) = self.cache.load(query).await {
            info!(hits = hits.len(), "serving scan from cache");
            return Ok(ScanReport::from_cache(run_id, hits));
        }

        let plan = self.plan();
        info!(
            sources = plan.len(),
            threads = config.threads,
            timeout_secs = config.timeout_per_probe_secs,
            "starting scan"
        );

        let mut resolved: Vec<Option<Resolved>> = (0..plan.len()).map(|_| None).collect();
        for (index, hits) in self.shortcut_pass(&plan, query, config).await {
            resolved[index] = Some(Resolved {
                outcome: ProbeOutcome::from_hits(hits),
                route: Route::Shortcut,
                elapsed: Duration::ZERO,
            });
        }

        let mut in_flight = FuturesUnordered::new();
        for (index, source) in plan.iter().enumerate() {
            if resolved[index].is_some() {
                continue;
            }
            let Some(probe) = source.probe.clone() else {
                resolved[index] = Some(Resolved {
                    outcome: ProbeOutcome::NotRegistered,
                    route: Route::Unregistered,
                    elapsed: Duration::ZERO,
                });
                continue;
            };

            in_flight.push(self.dispatch(
                index,
                source.name.clone(),
                probe,
                query,
                config.timeout_for(&source.name),
            ));

            // Respect concurrency limit
            while in_flight.len() >= config.threads {
                if let Some((index, outcome, elapsed)) = in_flight.next().await {
                    resolved[index] = Some(Resolved {
                        outcome,
                        route: Route::Probed,
                        elapsed,
                    });
                }
            }
        }

        // Collect remaining results
        while let Some((index, outcome, elapsed)) = in_flight.next().await {
            resolved[index] = Some(Resolved {
                outcome,
                route: Route::Probed,
                elapsed,
            });
        }

        let (hits, outcomes) = merge(&plan, resolved, query, config);

        if !config.bypass_cache {
            if let Err(e) = self.cache.store(query, &hits).await {
                warn!(error = %e, "failed to cache scan results");
            }
        }

        let fallbacks = hits.iter().filter(|h| h.is_fallback()).count();
        info!(
            hits = hits.len(),
            fallbacks,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "scan complete"
        );

        Ok(ScanReport {
            run_id,
            hits,
            outcomes,
            from_cache: false,
        })
    }

    /// Registered probes first (priority, then registration order), then
    /// catalog-only sites, then requested names known to neither.
    fn plan(&self) -> Vec<PlannedSource> {
        let mut plan = Vec::new();
        let mut seen = HashSet::new();

        for entry in self.registry.get_all() {
            let name = String::from(entry.name);
            let site = self.catalog.get(&name).cloned();
            if !self.filter.matches(&name, site.as_ref()) {
                continue;
            }
            seen.insert(name.clone());
            plan.push(PlannedSource {
                name,
                site,
                probe: Some(entry.probe),
            });
        }

        for site in self.catalog.iter() {
            if seen.contains(&site.name) || !self.filter.matches(&site.name, Some(site)) {
                continue;
            }
            seen.insert(site.name.clone());
            plan.push(PlannedSource {
                name: site.name.clone(),
                site: Some(site.clone()),
                probe: None,
            });
        }

        let known: Vec<&str> = seen.iter().map(String::as_str).collect();
        let unknown: Vec<String> = self
            .filter
            .unknown_names(&known)
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in unknown {
            if seen.insert(name.clone()) {
                debug!(source = %name, "requested source is not registered or catalogued");
                plan.push(PlannedSource {
                    name,
                    site: None,
                    probe: None,
                });
            }
        }

        plan
    }

    /// Ask the shortcut layer about every bound source concurrently.
    ///
    /// Each lookup shares the source's probe timeout. A lookup that runs out
    /// of time counts as no shortcut, so the live probe still runs.
    async fn shortcut_pass(
        &self,
        plan: &[PlannedSource],
        query: &Query,
        config: &ScanConfig,
    ) -> Vec<(usize, Vec<Hit>)> {
        let lookups = plan.iter().enumerate().filter_map(|(index, source)| {
            if !self.shortcuts.is_bound(&source.name) {
                return None;
            }
            let site = match &source.site {
                Some(site) => Cow::Borrowed(site),
                None => {
                    debug!(source = %source.name, "shortcut bound to uncatalogued source");
                    Cow::Owned(SiteDefinition::new(source.name.clone(), SiteCategory::Specialized))
                }
            };
            let timeout = config.timeout_for(&source.name);
            Some(async move {
                let lookup = self.shortcuts.lookup(&self.client, &site, query);
                match tokio::time::timeout(timeout, lookup).await {
                    Ok(hits) => (index, hits),
                    Err(_) => {
                        warn!(
                            source = %source.name,
                            timeout_secs = timeout.as_secs(),
                            "dataset shortcut timed out"
                        );
                        (index, None)
                    }
                }
            })
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(index, hits)| {
                let hits = hits?;
                debug!(source = %plan[index].name, hits = hits.len(), "resolved by dataset shortcut");
                Some((index, hits))
            })
            .collect()
    }

    /// Spawn one probe and return a future resolving to its outcome.
    ///
    /// The deadline starts at spawn time. On expiry the task is aborted and
    /// anything it gathered is discarded.
    fn dispatch(
        &self,
        index: usize,
        name: String,
        probe: Arc<dyn Probe>,
        query: &Query,
        timeout: Duration,
    ) -> impl Future<Output = (usize, ProbeOutcome, Duration)> {
        let client = self.client.clone();
        let query = query.clone();
        let span = tracing::debug_span!("probe", source = %name);
        let started = Instant::now();
        let deadline = started + timeout;

        let mut handle = tokio::spawn(
            async move { probe.probe(&client, &query).await }.instrument(span),
        );

        async move {
            let outcome = match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(Ok(hits))) => {
                    debug!(source = %name, hits = hits.len(), "probe finished");
                    ProbeOutcome::from_hits(hits)
                }
                Ok(Ok(Err(e))) => {
                    warn!(source = %name, error = %e, "probe failed");
                    ProbeOutcome::Failed(e.to_string())
                }
                Ok(Err(join_error)) => {
                    let reason = if join_error.is_panic() {
                        "probe panicked"
                    } else {
                        "probe cancelled"
                    };
                    warn!(source = %name, "{reason}");
                    ProbeOutcome::Failed(reason.to_string())
                }
                Err(_) => {
                    handle.abort();
                    warn!(source = %name, timeout_secs = timeout.as_secs(), "probe timed out");
                    ProbeOutcome::TimedOut
                }
            };
            (index, outcome, started.elapsed())
        }
    }
}

/// Build per-source blocks in plan order, adding fallbacks where a source
/// produced nothing usable.
fn merge(
    plan: &[PlannedSource],
    resolved: Vec<Option<Resolved>>,
    query: &Query,
    config: &ScanConfig,
) -> (Vec<Hit>, Vec<SourceReport>) {
    let mut hits = Vec::new();
    let mut outcomes = Vec::with_capacity(plan.len());

    for (source, slot) in plan.iter().zip(resolved) {
        let Resolved {
            outcome,
            route,
            elapsed,
        } = slot.unwrap_or(Resolved {
            outcome: ProbeOutcome::Failed("probe never completed".to_string()),
            route: Route::Probed,
            elapsed: Duration::ZERO,
        });

        let mut history = vec![ProbeState::Pending];
        match route {
            Route::Shortcut => history.push(ProbeState::Shortcut),
            Route::Unregistered => history.push(ProbeState::NotRegistered),
            Route::Probed => history.extend([ProbeState::Running, outcome.state()]),
        }
        history.push(ProbeState::Resolved);

        let fallback = outcome.needs_fallback();
        let site = source.site.as_ref();
        let fallback_for = |reason: FallbackReason<'_>| fallback_hits(config.engine, &source.name, site, query, reason);
        let block = match outcome {
            ProbeOutcome::Hits(found) => found,
            ProbeOutcome::Empty => fallback_for(FallbackReason::NoResults),
            ProbeOutcome::NotRegistered => fallback_for(FallbackReason::NotRegistered),
            ProbeOutcome::TimedOut => {
                fallback_for(FallbackReason::TimedOut(config.timeout_for(&source.name)))
            }
            ProbeOutcome::Failed(error) => fallback_for(FallbackReason::Failed(&error)),
        };

        outcomes.push(SourceReport {
            site: source.name.clone(),
            history,
            hit_count: block.len(),
            fallback,
            elapsed,
        });
        hits.extend(block);
    }

    (hits, outcomes)
}
