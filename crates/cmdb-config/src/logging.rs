//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::{ConfigError, LogConfig};

/// Environment variable holding a filter directive that overrides `log.level`.
pub const LOG_ENV: &str = "CMDB_LOG";

/// Build the filter: `CMDB_LOG` if set and valid, else `config.level`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if `log.level` is not a valid directive.
pub fn filter(config: &LogConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| ConfigError::InvalidValue {
        field: "log.level".into(),
        reason: e.to_string(),
    })
}

/// Install the global fmt subscriber.
///
/// Returns `false` if a subscriber was already installed; the existing one is
/// left in place.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if `log.level` is not a valid directive.
pub fn init(config: &LogConfig) -> Result<bool, ConfigError> {
    let filter = filter(config)?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .try_init()
        .is_ok())
}
