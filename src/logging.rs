//! Logging setup.
//!
//! The library itself only emits `tracing` events; binaries and tests call
//! one of these initialisers to see them.

use crate::error::{EnsembleError, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a console subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the level is DEBUG when `verbose`
/// and INFO when not.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| EnsembleError::Configuration(format!("logging: {e}")))?;

    tracing::info!(verbose, "logging initialized");
    Ok(())
}

/// Install a subscriber that writes through the test harness's capture.
///
/// Safe to call repeatedly; only the first call installs anything.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
