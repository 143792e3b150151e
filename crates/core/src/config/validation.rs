//! Bounds checks applied to a loaded [`AppConfig`].

use std::ops::RangeInclusive;

use crate::config::AppConfig;
use thiserror::Error;

const MAX_BODY_LIMIT: usize = 100 * 1024 * 1024;
const TIMEOUT_RANGE_MS: RangeInclusive<u64> = 100..=300_000;
const MAX_REDIRECT_LIMIT: usize = 20;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { field: field.to_string(), reason: reason.into() }
    }
}

impl AppConfig {
    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` naming the first offending field:
    /// - `max_age_ms` of 0
    /// - `max_bytes` of 0 or above 100 MiB
    /// - `timeout_ms` outside 100..=300000
    /// - `max_redirects` above 20
    /// - a blank `user_agent`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_age_ms == 0 {
            return Err(ConfigError::invalid("max_age_ms", "must be greater than 0"));
        }

        if self.max_bytes == 0 || self.max_bytes > MAX_BODY_LIMIT {
            return Err(ConfigError::invalid("max_bytes", format!("must be between 1 and {MAX_BODY_LIMIT}")));
        }

        if !TIMEOUT_RANGE_MS.contains(&self.timeout_ms) {
            return Err(ConfigError::invalid(
                "timeout_ms",
                format!("must be between {} and {}", TIMEOUT_RANGE_MS.start(), TIMEOUT_RANGE_MS.end()),
            ));
        }

        if self.max_redirects > MAX_REDIRECT_LIMIT {
            return Err(ConfigError::invalid("max_redirects", format!("must not exceed {MAX_REDIRECT_LIMIT}")));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }

        if self.max_redirects == 0 {
            tracing::warn!("max_redirects is 0; redirected assets will fail to load");
        }

        Ok(())
    }
}
