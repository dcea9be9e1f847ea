//! Per-source outcomes, states and the scan report.

use serde::Serialize;
use std::time::Duration;
use trawl_core::Hit;
use uuid::Uuid;

/// What happened when a source was probed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Real hits (never empty)
    Hits(Vec<Hit>),
    /// The probe ran and found nothing
    Empty,
    /// The probe exceeded its timeout
    TimedOut,
    /// The probe returned an error or panicked
    Failed(String),
    /// No probe is registered for the source
    NotRegistered,
}

impl ProbeOutcome {
    /// `Hits` for a non-empty vector, `Empty` otherwise.
    #[must_use]
    pub fn from_hits(hits: Vec<Hit>) -> Self {
        if hits.is_empty() {
            Self::Empty
        } else {
            Self::Hits(hits)
        }
    }

    /// Timeouts, failures and missing probes.
    #[must_use]
    pub fn is_soft_failure(&self) -> bool {
        matches!(self, Self::TimedOut | Self::Failed(_) | Self::NotRegistered)
    }

    /// Whether the source resolves to fallback links.
    #[must_use]
    pub fn needs_fallback(&self) -> bool {
        !matches!(self, Self::Hits(_))
    }

    /// Terminal state recorded for this outcome.
    #[must_use]
    pub fn state(&self) -> ProbeState {
        match self {
            Self::Hits(_) => ProbeState::Succeeded,
            Self::Empty => ProbeState::Empty,
            Self::TimedOut => ProbeState::TimedOut,
            Self::Failed(_) => ProbeState::Failed,
            Self::NotRegistered => ProbeState::NotRegistered,
        }
    }
}

/// Lifecycle of one source within a run.
///
/// `Pending → (Shortcut | Running) → (Succeeded | Empty | TimedOut | Failed)
/// → Resolved`. Sources without a probe go `Pending → NotRegistered →
/// Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeState {
    Pending,
    Shortcut,
    Running,
    Succeeded,
    Empty,
    TimedOut,
    Failed,
    NotRegistered,
    Resolved,
}

impl ProbeState {
    /// Whether `next` may follow `self`.
    #[must_use]
    pub fn can_transition_to(self, next: ProbeState) -> bool {
        use ProbeState::{
            Empty, Failed, NotRegistered, Pending, Resolved, Running, Shortcut, Succeeded, TimedOut,
        };
        matches!(
            (self, next),
            (Pending, Shortcut | Running | NotRegistered)
                | (Running, Succeeded | Empty | TimedOut | Failed)
                | (Shortcut | Succeeded | Empty | TimedOut | Failed | NotRegistered, Resolved)
        )
    }
}

/// How one source was resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    /// Source name
    pub site: String,
    /// States passed through, ending in `Resolved`
    pub history: Vec<ProbeState>,
    /// Hits emitted for the source, fallbacks included
    pub hit_count: usize,
    /// Whether the emitted hits are fallback links
    pub fallback: bool,
    /// Time spent probing (zero when no probe ran)
    pub elapsed: Duration,
}

impl SourceReport {
    /// The state before `Resolved`.
    #[must_use]
    pub fn state(&self) -> ProbeState {
        self.history
            .iter()
            .rev()
            .copied()
            .find(|s| *s != ProbeState::Resolved)
            .unwrap_or(ProbeState::Pending)
    }
}

/// Result of one scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Identifies the run in logs
    pub run_id: Uuid,
    /// Merged hits, one contiguous block per source
    pub hits: Vec<Hit>,
    /// Per-source resolution, in merge order; empty when served from cache
    pub outcomes: Vec<SourceReport>,
    /// Whether the hits came from the result cache
    pub from_cache: bool,
}

impl ScanReport {
    /// Report for hits served from the result cache.
    #[must_use]
    pub fn from_cache(run_id: Uuid, hits: Vec<Hit>) -> Self {
        Self {
            run_id,
            hits,
            outcomes: Vec::new(),
            from_cache: true,
        }
    }

    /// Report for a named source.
    #[must_use]
    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.outcomes.iter().find(|s| s.site == name)
    }

    /// Number of fallback hits.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.hits.iter().filter(|h| h.is_fallback()).count()
    }

    #[must_use]
    pub fn into_hits(self) -> Vec<Hit> {
        self.hits
    }
}
