//! Backoff and polite-delay timing.

use rand::Rng;
use std::time::Duration;
use trawl_core::FetchConfig;

/// Retry budget and backoff base for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            retries: config.retries,
            base: config.backoff_base(),
        }
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`,
    /// scaled by a random factor in `[0.5, 1.5)`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.base.is_zero() {
            return Duration::ZERO;
        }
        let exp = self.base.saturating_mul(2u32.saturating_pow(attempt.min(16)));
        let factor = rand::thread_rng().gen_range(0.5..1.5);
        exp.mul_f64(factor)
    }
}

/// Polite delay: uniform in `[min_ms, max_ms]`, zero when both bounds are zero.
#[must_use]
pub fn polite_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms == 0 || min_ms >= max_ms {
        return Duration::from_millis(min_ms.min(max_ms));
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}
