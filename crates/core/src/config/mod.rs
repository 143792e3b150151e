//! Application configuration with layered loading.
//!
//! Sources, highest precedence first:
//!
//! 1. Environment variables (`ASSET_CACHE_*`)
//! 2. TOML file named by `ASSET_CACHE_CONFIG_FILE`
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::freshness::DEFAULT_MAX_AGE_MS;

mod validation;

pub use validation::ConfigError;

/// Prefix shared by every configuration environment variable.
pub const ENV_PREFIX: &str = "ASSET_CACHE_";

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_VAR: &str = "ASSET_CACHE_CONFIG_FILE";

/// Runtime settings for the cache and its fetcher.
///
/// Every field can be set through `ASSET_CACHE_<FIELD>`, e.g.
/// `ASSET_CACHE_MAX_AGE_MS=3600000`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file holding cached assets.
    pub db_path: PathBuf,

    /// Age in milliseconds after which a cached asset is revalidated.
    pub max_age_ms: u64,

    pub user_agent: String,

    /// Largest response body accepted, in bytes.
    pub max_bytes: usize,

    /// Per-request network timeout in milliseconds.
    pub timeout_ms: u64,

    pub max_redirects: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./asset-cache.sqlite"),
            max_age_ms: DEFAULT_MAX_AGE_MS,
            user_agent: format!("asset-cache/{}", env!("CARGO_PKG_VERSION")),
            max_bytes: 25 * 1024 * 1024,
            timeout_ms: 20_000,
            max_redirects: 5,
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Staleness threshold as a `Duration`.
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }

    /// Layered figment over the defaults, the optional file and the environment.
    pub fn figment(config_file: Option<&str>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Load and validate configuration from the process environment.
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadFailed` when a source cannot be read or parsed,
    /// `ConfigError::Invalid` when a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = std::env::var(CONFIG_FILE_VAR).ok();
        let config: Self = Self::figment(config_file.as_deref())
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }
}
