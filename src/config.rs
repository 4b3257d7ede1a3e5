//! Configuration types for wxarb

use crate::events::Side;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

/// Recorded-data location
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Backtest defaults, overridable per run from the CLI
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestConfig {
    /// `actual` or `fixed_N`
    #[serde(default = "default_latency_model")]
    pub latency_model: String,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            latency_model: default_latency_model(),
        }
    }
}

fn default_latency_model() -> String {
    "actual".to_string()
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// One strategy instance to load for a run
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    pub id: String,
    /// Strategy implementation to instantiate (currently `threshold`)
    pub kind: String,
    pub series: String,
    pub station: String,
    pub trigger_value: f64,
    #[serde(default = "default_consecutive_obs")]
    pub consecutive_obs: u32,
    pub side: Side,
    pub max_price_cents: u32,
    /// 0 = uncapped
    #[serde(default)]
    pub max_spend_cents: u32,
    pub quantity: u32,
}

fn default_consecutive_obs() -> u32 {
    2
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        [storage]
        data_dir = "./data"

        [backtest]
        latency_model = "actual"

        [telemetry]
        log_level = "info"

        [[strategies]]
        id = "chi-ladder"
        kind = "threshold"
        series = "KXHIGHCHI"
        station = "KMDW"
        trigger_value = 43.0
        consecutive_obs = 2
        side = "no"
        max_price_cents = 95
        max_spend_cents = 500
        quantity = 10
    "#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(EXAMPLE).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(config.backtest.latency_model, "actual");
        assert_eq!(config.strategies.len(), 1);
        assert_eq!(config.strategies[0].side, Side::No);
        assert_eq!(config.strategies[0].consecutive_obs, 2);
    }

    #[test]
    fn test_backtest_section_optional() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            data_dir = "./data"

            [telemetry]
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.backtest.latency_model, "actual");
        assert!(config.strategies.is_empty());
    }

    #[test]
    fn test_strategy_defaults() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            data_dir = "./data"

            [telemetry]
            log_level = "info"

            [[strategies]]
            id = "ny"
            kind = "threshold"
            series = "KXHIGHNY"
            station = "KNYC"
            trigger_value = 39.5
            side = "yes"
            max_price_cents = 90
            quantity = 5
            "#,
        )
        .unwrap();
        let s = &config.strategies[0];
        assert_eq!(s.max_spend_cents, 0);
        assert_eq!(s.consecutive_obs, 2);
    }
}
