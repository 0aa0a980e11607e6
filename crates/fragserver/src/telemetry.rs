//! Tracing subscriber setup.
//!
//! Logs go to stdout through the fmt layer. The filter comes from
//! `telemetry.log_level`, which already has `RUST_LOG` folded in by the
//! config loader.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Call once, before anything logs.
pub fn init(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("Invalid log filter: {log_level}"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(filter = log_level, "tracing initialized");
    Ok(())
}
