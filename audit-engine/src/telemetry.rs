// Tracing subscriber setup
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{AuditLogError, Result};

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            AuditLogError::Configuration(format!("invalid log level '{}': {}", config.level, e))
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(true)
        .try_init()
        .map_err(|e| AuditLogError::Configuration(format!("tracing already initialised: {}", e)))
}
