//! Tracing subscriber bootstrap for binaries

use crate::config::{LogFormat, LoggingConfig};
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| NegotiationError::Configuration(format!("invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    installed.map_err(|e| NegotiationError::Configuration(e.to_string()))
}
