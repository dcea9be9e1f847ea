//! `tracing` subscriber initialisation.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter directive.
pub const DEFAULT_FILTER: &str = "info,trawl=info";

/// Filter directive used when debug logging is requested.
pub const DEBUG_FILTER: &str = "debug,trawl=debug";

/// Build the filter: `RUST_LOG` wins, otherwise the default or debug directive.
#[must_use]
pub fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { DEBUG_FILTER } else { DEFAULT_FILTER })
    })
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed, in which case the
/// call has no effect.
pub fn init_tracing(debug: bool) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter(debug))
        .try_init()
        .is_ok()
}
