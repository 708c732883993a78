//! Tracing setup

use tracing_subscriber::EnvFilter;

use crate::{
    config::LoggingConfig,
    error::{Error, Result},
};

/// Install the global tracing subscriber
///
/// Invalid filter directives fall back to `info`. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| Error::Internal(format!("Failed to initialize tracing: {}", e)))?;

    tracing::info!(level = %config.level, "Tracing initialized");

    Ok(())
}
