//! Tracing subscriber setup

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{HdevError, HdevResult};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this twice
/// returns a configuration error instead of panicking.
pub fn init_logging(config: &LoggingConfig) -> HdevResult<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| HdevError::config(format!("failed to initialise logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> HdevResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| HdevError::config(format!("invalid log level '{}': {}", config.level, e)))
}
