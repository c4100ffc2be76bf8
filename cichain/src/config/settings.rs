//! Runtime settings for the pipeline chain and config resolution.

use crate::chain::RetryConfig;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Settings for `extends` resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendsConfig {
    /// Maximum depth of an `extends` chain.
    #[serde(default = "default_max_nesting_levels")]
    pub max_nesting_levels: usize,
}

fn default_max_nesting_levels() -> usize {
    10
}

impl Default for ExtendsConfig {
    fn default() -> Self {
        Self {
            max_nesting_levels: default_max_nesting_levels(),
        }
    }
}

/// Settings shared by every chain step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Retry policy for optimistic-lock conflicts.
    #[serde(default)]
    pub optimistic_lock: RetryConfig,
    /// `extends` resolution settings.
    #[serde(default)]
    pub extends: ExtendsConfig,
    /// Lookback window of the active jobs quota.
    #[serde(default = "default_job_activity_window_hours")]
    pub job_activity_window_hours: u32,
}

fn default_job_activity_window_hours() -> u32 {
    24
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            optimistic_lock: RetryConfig::default(),
            extends: ExtendsConfig::default(),
            job_activity_window_hours: default_job_activity_window_hours(),
        }
    }
}

impl ChainConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the optimistic-lock retry policy.
    #[must_use]
    pub fn with_optimistic_lock(mut self, retry: RetryConfig) -> Self {
        self.optimistic_lock = retry;
        self
    }

    /// Sets the maximum `extends` depth.
    #[must_use]
    pub fn with_max_nesting_levels(mut self, levels: usize) -> Self {
        self.extends.max_nesting_levels = levels;
        self
    }

    /// Sets the active jobs window.
    #[must_use]
    pub fn with_job_activity_window_hours(mut self, hours: u32) -> Self {
        self.job_activity_window_hours = hours;
        self
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.optimistic_lock.max_attempts == 0 {
            return Err(ConfigError(
                "optimistic_lock.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.optimistic_lock.base_delay_ms > self.optimistic_lock.max_delay_ms {
            return Err(ConfigError(
                "optimistic_lock.base_delay_ms must not exceed max_delay_ms".to_string(),
            ));
        }
        if self.extends.max_nesting_levels == 0 {
            return Err(ConfigError(
                "extends.max_nesting_levels must be at least 1".to_string(),
            ));
        }
        if self.job_activity_window_hours == 0 {
            return Err(ConfigError(
                "job_activity_window_hours must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
