//! CLI interface for wxarb
//!
//! Provides subcommands for:
//! - `run`: Replay recorded data through the configured strategies
//! - `config`: Show the loaded configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "wxarb")]
#[command(about = "Deterministic backtester for Kalshi weather temperature markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Log verbosity (overrides the config file)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a backtest over recorded data
    Run(RunArgs),
    /// Show current configuration
    Config,
}
