//! # Logging
//!
//! Tracing subscriber setup. `RUST_LOG` overrides the default filter.

use crate::constants::DEFAULT_LOG_FILTER;
use tracing::warn;

/// Install the global fmt subscriber. Safe to call more than once.
pub fn init_tracing() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .try_init()
    {
        warn!("Tracing subscriber already initialized: {}", e);
    }
}
