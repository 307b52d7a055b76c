//! Logger initialization
//!
//! Application code logs through the `log` facade. Records are bridged into a
//! `tracing-subscriber` formatter so dependency spans and `log` records end up
//! in the same output.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize the global logger.
///
/// # Arguments
/// * `default_filter` - Filter directives used when `RUST_LOG` is not set
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - A global logger or subscriber was already installed
pub fn init_logger(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_log::LogTracer::init().map_err(|e| anyhow::anyhow!("Failed to bridge log records: {}", e))?;

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}
