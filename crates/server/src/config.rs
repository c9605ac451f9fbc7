//! Server configuration
//!
//! JSON-backed; every field has a default so `{}` is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Root configuration for a live data server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveDataServerConfig {
    #[serde(default)]
    pub expiration: ExpirationConfig,

    /// Track a sliding updates-per-second rate
    #[serde(default = "default_performance_counting")]
    pub performance_counting: bool,

    /// Width of the rate window in seconds
    #[serde(default = "default_performance_window_secs")]
    pub performance_window_secs: u64,

    /// Rule set used when subscribing by bare raw id
    #[serde(default = "default_normalization_rule_set_id")]
    pub default_normalization_rule_set_id: String,

    #[serde(default)]
    pub combining: CombiningConfig,
}

fn default_performance_counting() -> bool {
    true
}

fn default_performance_window_secs() -> u64 {
    60
}

fn default_normalization_rule_set_id() -> String {
    livedata_core::StandardRules::OPENGAMMA_RULE_SET_ID.to_string()
}

impl Default for LiveDataServerConfig {
    fn default() -> Self {
        Self {
            expiration: ExpirationConfig::default(),
            performance_counting: default_performance_counting(),
            performance_window_secs: default_performance_window_secs(),
            default_normalization_rule_set_id: default_normalization_rule_set_id(),
            combining: CombiningConfig::default(),
        }
    }
}

impl LiveDataServerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expiration.check_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "expiration.check_period_ms must be positive".into(),
            ));
        }
        if self.expiration.timeout_extension_ms == 0 {
            return Err(ConfigError::Invalid(
                "expiration.timeout_extension_ms must be positive".into(),
            ));
        }
        if self.performance_counting && self.performance_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "performance_window_secs must be positive when counting".into(),
            ));
        }
        if self.combining.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "combining.max_concurrency must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Expiration manager tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationConfig {
    /// How often expired distributors are swept
    #[serde(default = "default_check_period_ms")]
    pub check_period_ms: u64,

    /// How far a subscribe or heartbeat pushes expiry forward
    #[serde(default = "default_timeout_extension_ms")]
    pub timeout_extension_ms: u64,
}

fn default_check_period_ms() -> u64 {
    60_000
}

fn default_timeout_extension_ms() -> u64 {
    600_000
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            check_period_ms: default_check_period_ms(),
            timeout_extension_ms: default_timeout_extension_ms(),
        }
    }
}

impl ExpirationConfig {
    pub fn check_period(&self) -> Duration {
        Duration::from_millis(self.check_period_ms)
    }

    pub fn timeout_extension(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.timeout_extension_ms).unwrap_or(i64::MAX))
    }
}

/// Combining server tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombiningConfig {
    /// Maximum number of underlying servers called at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for CombiningConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
