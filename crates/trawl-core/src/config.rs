//! Configuration management for Trawl.
//!
//! Provides TOML-based configuration with platform config paths and
//! environment variable overrides. The scanner and fetch layers never read
//! the environment themselves; they receive a [`ScanConfig`] and a
//! [`FetchConfig`] built from [`AppConfig`].

use crate::engine::SearchEngine;
use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Minimum worker count for a scan.
pub const MIN_THREADS: usize = 2;
/// Maximum worker count for a scan.
pub const MAX_THREADS: usize = 40;
/// Minimum per-probe timeout in seconds.
pub const MIN_TIMEOUT_SECS: u64 = 1;
/// Maximum per-probe timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 60;
/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 12;
/// Default number of retries for transient HTTP failures.
pub const DEFAULT_RETRIES: u32 = 1;

/// Main application configuration.
///
/// This is loaded from `~/.config/trawl/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Verbose logging
    pub debug: bool,
    /// Scan orchestration settings
    pub scan: ScanConfig,
    /// HTTP fetch settings
    pub fetch: FetchConfig,
    /// Built-in probe settings
    pub probes: ProbeConfig,
    /// Result cache settings
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `TRAWL_REMOTE_RENDER`: Enable the remote render fallback (`1`/`true`)
    /// - `TRAWL_DEBUG`: Enable verbose logging (`1`/`true`)
    /// - `TRAWL_THREADS`: Override the worker count
    /// - `TRAWL_TIMEOUT`: Override the per-probe timeout in seconds
    /// - `TRAWL_ENGINE`: Override the dork search engine
    /// - `HIBP_API_KEY`: HaveIBeenPwned API key
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Unparseable values are ignored and logged.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("TRAWL_REMOTE_RENDER") {
            self.fetch.remote_render_enabled = parse_flag(&val);
            tracing::debug!(
                "Override fetch.remote_render_enabled from env: {}",
                self.fetch.remote_render_enabled
            );
        }

        if let Some(val) = lookup("TRAWL_DEBUG") {
            self.debug = parse_flag(&val);
            tracing::debug!("Override debug from env: {}", self.debug);
        }

        if let Some(val) = lookup("TRAWL_THREADS") {
            match val.trim().parse() {
                Ok(threads) => {
                    self.scan.threads = threads;
                    tracing::debug!("Override scan.threads from env: {}", threads);
                }
                Err(_) => tracing::warn!(value = %val, "ignoring invalid TRAWL_THREADS"),
            }
        }

        if let Some(val) = lookup("TRAWL_TIMEOUT") {
            match val.trim().parse() {
                Ok(secs) => {
                    self.scan.timeout_per_probe_secs = secs;
                    tracing::debug!("Override scan.timeout_per_probe_secs from env: {}", secs);
                }
                Err(_) => tracing::warn!(value = %val, "ignoring invalid TRAWL_TIMEOUT"),
            }
        }

        if let Some(val) = lookup("TRAWL_ENGINE") {
            self.scan.engine = SearchEngine::guard(&val);
            tracing::debug!("Override scan.engine from env: {}", self.scan.engine);
        }

        if let Some(val) = lookup("HIBP_API_KEY") {
            let key = val.trim();
            if !key.is_empty() {
                self.probes.hibp_api_key = Some(key.to_string());
            }
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.scan.validate()?;
        self.fetch.validate()
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/trawl/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the cache directory path.
    ///
    /// Uses XDG base directories: `~/.cache/trawl`
    pub fn cache_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.cache_dir().to_path_buf())
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("org", "trawl", "trawl").ok_or(ConfigError::NoConfigDir)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Scan orchestration settings.
///
/// Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum number of probes in flight
    pub threads: usize,
    /// Per-probe timeout in seconds
    pub timeout_per_probe_secs: u64,
    /// Engine used for fallback dork links
    pub engine: SearchEngine,
    /// Skip the cache read and write, clearing any stored entry
    pub bypass_cache: bool,
    /// Sources registered ahead of the rest
    pub priority_sources: Vec<String>,
    /// Per-source timeout floors in seconds for sources that are slow by nature
    pub slow_source_timeouts: BTreeMap<String, u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: 12,
            timeout_per_probe_secs: DEFAULT_TIMEOUT_SECS,
            engine: SearchEngine::default(),
            bypass_cache: false,
            priority_sources: [
                "Username Pack (direct)",
                "FamilyTreeNow",
                "WhoCallsMe",
                "HaveIBeenPwned",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            slow_source_timeouts: BTreeMap::from([("Username Pack (direct)".to_string(), 20)]),
        }
    }
}

impl ScanConfig {
    /// Check that threads and timeout are within their valid ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(MIN_THREADS..=MAX_THREADS).contains(&self.threads) {
            return Err(ConfigError::InvalidValue {
                field: "scan.threads".to_string(),
                reason: format!(
                    "must be {MIN_THREADS}-{MAX_THREADS}, got {}",
                    self.threads
                ),
            });
        }
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.timeout_per_probe_secs) {
            return Err(ConfigError::InvalidValue {
                field: "scan.timeout_per_probe_secs".to_string(),
                reason: format!(
                    "must be {MIN_TIMEOUT_SECS}-{MAX_TIMEOUT_SECS}, got {}",
                    self.timeout_per_probe_secs
                ),
            });
        }
        Ok(())
    }

    /// Return a copy with threads and timeout coerced into range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            threads: self.threads.clamp(MIN_THREADS, MAX_THREADS),
            timeout_per_probe_secs: self
                .timeout_per_probe_secs
                .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
            ..self.clone()
        }
    }

    /// The configured per-probe timeout.
    #[must_use]
    pub fn timeout_per_probe(&self) -> Duration {
        Duration::from_secs(self.timeout_per_probe_secs)
    }

    /// Effective timeout for a source: the per-probe timeout, raised to the
    /// source's slow-source floor if it has one.
    #[must_use]
    pub fn timeout_for(&self, source: &str) -> Duration {
        let floor = self.slow_source_timeouts.get(source).copied().unwrap_or(0);
        Duration::from_secs(self.timeout_per_probe_secs.max(floor))
    }
}

/// User-agent selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UaRotation {
    /// Uniformly random per request
    #[default]
    Random,
    /// Cycle through the pool in order
    RoundRobin,
}

/// HTTP fetch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures
    pub retries: u32,
    /// Base backoff delay in milliseconds
    pub backoff_base_ms: u64,
    /// Lower bound of the polite delay before each request
    pub jitter_min_ms: u64,
    /// Upper bound of the polite delay before each request
    pub jitter_max_ms: u64,
    /// Fetch a server-rendered copy when a page looks script-gated
    pub remote_render_enabled: bool,
    /// Prefix the scheme-stripped target URL is appended to
    pub render_endpoint: String,
    /// Use the cookie-replaying browser-profile transport
    pub challenge_transport: bool,
    /// Bodies with fewer non-whitespace characters count as gated
    pub min_body_len: usize,
    /// User-agent pool; the built-in pool is used when empty
    pub user_agents: Vec<String>,
    /// User-agent selection strategy
    pub ua_rotation: UaRotation,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            backoff_base_ms: 600,
            jitter_min_ms: 150,
            jitter_max_ms: 450,
            remote_render_enabled: false,
            render_endpoint: "https://r.jina.ai/".to_string(),
            challenge_transport: false,
            min_body_len: 64,
            user_agents: Vec::new(),
            ua_rotation: UaRotation::default(),
        }
    }
}

impl FetchConfig {
    /// Default request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base backoff delay.
    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Copy with the polite delay and backoff disabled.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.jitter_min_ms = 0;
        self.jitter_max_ms = 0;
        self.backoff_base_ms = 0;
        self
    }

    /// Check timeout, jitter bounds and render endpoint.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.jitter_min_ms > self.jitter_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "fetch.jitter_min_ms".to_string(),
                reason: format!(
                    "must not exceed jitter_max_ms ({} > {})",
                    self.jitter_min_ms, self.jitter_max_ms
                ),
            });
        }
        if self.remote_render_enabled && self.render_endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "fetch.render_endpoint".to_string(),
                reason: "required when remote_render_enabled is set".to_string(),
            });
        }
        Ok(())
    }
}

/// Built-in probe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Stop the username pack after this many positives
    pub username_pack_max_positives: usize,
    /// Maximum breach hits reported by HaveIBeenPwned
    pub hibp_max_breaches: usize,
    /// Pause before the HaveIBeenPwned request, in milliseconds
    pub hibp_pause_ms: u64,
    /// HaveIBeenPwned API key (from the environment, never written to disk)
    #[serde(skip)]
    pub hibp_api_key: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            username_pack_max_positives: 8,
            hibp_max_breaches: 10,
            hibp_pause_ms: 1700,
            hibp_api_key: None,
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory; defaults to `<platform cache dir>/results`
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Resolve the cache directory.
    pub fn resolve_dir(&self) -> ConfigResult<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(AppConfig::cache_dir()?.join("results")),
        }
    }
}
