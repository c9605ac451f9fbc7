//! Node configuration
//!
//! One JSON document: the server section plus the simulated feed and the
//! raw ids to keep subscribed.

use livedata_server::{ConfigError, LiveDataServerConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub server: LiveDataServerConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    /// Raw ids subscribed persistently at startup
    #[serde(default)]
    pub subscriptions: Vec<String>,

    /// How long the binary runs before shutting down; 0 runs until Ctrl-C
    #[serde(default = "default_run_duration_secs")]
    pub run_duration_secs: u64,

    /// Capacity of every in-process channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_run_duration_secs() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let feed = FeedConfig::default();
        Self {
            subscriptions: feed.tickers.keys().cloned().collect(),
            server: LiveDataServerConfig::default(),
            feed,
            run_duration_secs: default_run_duration_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Simulated upstream feed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Identifier scheme the feed's raw ids live in
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Ticker → starting price
    #[serde(default = "default_tickers")]
    pub tickers: BTreeMap<String, Decimal>,

    /// Maximum relative move per tick (0.001 = 0.1%)
    #[serde(default = "default_volatility")]
    pub volatility: Decimal,

    /// Relative bid/ask spread around the last price
    #[serde(default = "default_spread")]
    pub spread: Decimal,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Fixed seed for a reproducible walk
    #[serde(default)]
    pub seed: Option<u64>,

    /// Tickers the feed refuses with a permission-denied snapshot
    #[serde(default)]
    pub denied: Vec<String>,
}

fn default_scheme() -> String {
    "SIM".to_string()
}

fn default_tickers() -> BTreeMap<String, Decimal> {
    BTreeMap::from([
        ("AAPL".to_string(), dec!(190)),
        ("MSFT".to_string(), dec!(410)),
        ("EURUSD".to_string(), dec!(1.08)),
    ])
}

fn default_volatility() -> Decimal {
    dec!(0.001)
}

fn default_spread() -> Decimal {
    dec!(0.0002)
}

fn default_tick_interval_ms() -> u64 {
    250
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            tickers: default_tickers(),
            volatility: default_volatility(),
            spread: default_spread(),
            tick_interval_ms: default_tick_interval_ms(),
            seed: None,
            denied: Vec::new(),
        }
    }
}

impl RunnerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        if self.feed.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "feed.tick_interval_ms must be positive".into(),
            ));
        }
        if self.feed.tickers.values().any(|price| *price <= Decimal::ZERO) {
            return Err(ConfigError::Invalid(
                "feed.tickers prices must be positive".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channel_capacity must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RunnerConfig::from_json("{}").unwrap();
        assert_eq!(config.feed, FeedConfig::default());
        assert_eq!(config.run_duration_secs, 30);
        // subscriptions default to none when the document omits them
        assert!(config.subscriptions.is_empty());
    }

    #[test]
    fn test_parse_feed_section() {
        let config = RunnerConfig::from_json(
            r#"{
                "feed": {
                    "tickers": { "FOO": "12.5" },
                    "tick_interval_ms": 100,
                    "seed": 7,
                    "denied": ["SECRET"]
                },
                "subscriptions": ["FOO"],
                "server": { "default_normalization_rule_set_id": "No Normalization" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.feed.tickers.get("FOO"), Some(&dec!(12.5)));
        assert_eq!(config.feed.seed, Some(7));
        assert_eq!(config.feed.scheme, "SIM");
        assert_eq!(config.subscriptions, vec!["FOO".to_string()]);
        assert_eq!(
            config.server.default_normalization_rule_set_id,
            "No Normalization"
        );
    }

    #[test]
    fn test_rejects_zero_tick_interval() {
        let result = RunnerConfig::from_json(r#"{ "feed": { "tick_interval_ms": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let result = RunnerConfig::from_json(r#"{ "feed": { "tickers": { "X": "0" } } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
