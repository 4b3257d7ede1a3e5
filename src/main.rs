use clap::Parser;
use wxarb::cli::{Cli, Commands};
use wxarb::config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry; CLI verbosity wins over the config file
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.telemetry.log_level.clone());
    wxarb::telemetry::init_logging(&log_level)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting backtest");
            args.execute(&config)?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Data dir:  {}", config.storage.data_dir.display());
            println!("  Latency:   {}", config.backtest.latency_model);
            println!("  Log level: {}", log_level);
            for s in &config.strategies {
                println!(
                    "  Strategy:  {} ({}) series={} station={} trigger={}",
                    s.id, s.kind, s.series, s.station, s.trigger_value
                );
            }
        }
    }

    Ok(())
}
