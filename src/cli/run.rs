//! Backtest run command

use crate::config::Config;
use crate::data::DayStore;
use crate::error::BacktestError;
use crate::replay::{ReplayDriver, RunSpec};
use crate::strategy;
use crate::timeline::LatencyModel;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Start date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,

    /// End date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: String,

    /// Limit to specific series (e.g. KXHIGHCHI KXHIGHNY)
    #[arg(long, num_args = 1..)]
    pub series: Option<Vec<String>>,

    /// Latency model: actual | fixed_N (defaults to the config file)
    #[arg(long)]
    pub latency: Option<String>,

    /// Export fills to a CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

fn parse_date(label: &str, value: &str) -> Result<NaiveDate, BacktestError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| BacktestError::Config(format!("bad {label} date `{value}` (want YYYY-MM-DD)")))
}

impl RunArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let latency_model: LatencyModel = self
            .latency
            .as_deref()
            .unwrap_or(&config.backtest.latency_model)
            .parse()?;

        let spec = RunSpec {
            start_date: parse_date("start", &self.start)?,
            end_date: parse_date("end", &self.end)?,
            series_filter: self.series.clone(),
            latency_model,
        };

        let store = DayStore::new(&config.storage.data_dir);
        let mut driver = ReplayDriver::from_store(store, spec)?;

        for handler in strategy::build(&config.strategies, &driver.clock())? {
            driver.register_strategy(handler);
        }
        if config.strategies.is_empty() {
            tracing::warn!("no strategies configured; run will validate data but emit no fills");
        }

        let result = driver.run()?;

        if let Some(path) = &self.export {
            result.write_csv(path)?;
        }

        println!("{}", result.format_table());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_ok() {
        assert_eq!(
            parse_date("start", "2026-02-20").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 20).unwrap()
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("start", "02/20/2026").is_err());
        assert!(parse_date("end", "2026-13-40").is_err());
    }
}
