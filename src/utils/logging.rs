//! Structured logging configuration.
//!
//! Thin wrapper around `tracing-subscriber`: the `RUST_LOG` environment
//! variable wins when set, otherwise the configured level applies.

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber from the logging configuration.
///
/// # Errors
/// Returns `ProtocolError::ConfigError` if a global subscriber is already
/// installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.log_to_console {
        builder.try_init()
    } else {
        builder.with_writer(std::io::sink).try_init()
    };

    result.map_err(|e| ProtocolError::ConfigError(format!("Failed to install subscriber: {e}")))
}
