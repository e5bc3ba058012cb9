//! # cmdb-config
//!
//! Layered configuration loading for the CMDB using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CMDB_*` prefix, `__` as separator)
//! 2. Project-level `.cmdb/config.toml`
//! 3. User-level `~/.config/cmdb/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CMDB_STORE__TRAIL_DIR` -> `store.trail_dir`,
//! `CMDB_LOG__LEVEL` -> `log.level`, etc. `CMDB_LOG` itself is reserved for the
//! log filter directive read by [`logging::init`] and is not part of the config.
//!
//! # Usage
//!
//! ```no_run
//! use cmdb_config::CmdbConfig;
//!
//! let config = CmdbConfig::load_with_dotenv().expect("config");
//! cmdb_config::logging::init(&config.log).expect("log filter");
//!
//! if config.store.is_configured() {
//!     println!("Trail directory: {}", config.store.trail_dir);
//! }
//! ```

mod error;
mod log;
pub mod logging;
mod store;

pub use error::ConfigError;
pub use log::LogConfig;
pub use store::StoreConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "CMDB_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CmdbConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl CmdbConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or the result is inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration after reading `.env` from the current directory or
    /// one of its parents.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        // A missing .env is not an error.
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and check a configuration from any figment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` on extraction failure and
    /// `ConfigError::NotConfigured` if the trail is enabled without a directory.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path().filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".cmdb/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["LOG"]).split("__"))
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` for an enabled trail without a
    /// directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.trail_enabled && !self.store.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "store".into(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cmdb").join("config.toml"))
    }
}
