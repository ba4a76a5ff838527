//! Pure market making simulator - Entry Point
//!
//! `run`: one simulation over a candle series, writing the metrics series.
//! `sweep`: the same series over a grid of trend and inventory scalars.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

/// Candle-driven pure market making simulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PMM_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Candle file (.csv or .jsonl), overrides simulation.candles
    #[arg(long, global = true)]
    candles: Option<PathBuf>,

    /// Fill model seed, overrides simulation.seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single simulation (default)
    Run {
        /// Metrics series output (.csv or .jsonl), overrides output.metrics
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Prometheus text dump, overrides output.prometheus
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// Fill log output (.csv or .jsonl), overrides output.fills
        #[arg(long)]
        fills: Option<PathBuf>,
    },
    /// Run the trend × inventory scalar grid
    Sweep {
        /// Summary output (.jsonl), overrides sweep.output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    pmm_telemetry::init_logging()?;

    info!("Starting pmm-sim v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > PMM_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("PMM_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = pmm_bot::AppConfig::from_file(&config_path)?;

    if let Some(candles) = args.candles {
        config.simulation.candles = candles;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }

    match args.command.unwrap_or(Command::Run {
        output: None,
        metrics: None,
        fills: None,
    }) {
        Command::Run {
            output,
            metrics,
            fills,
        } => {
            if let Some(path) = output {
                config.output.metrics = path;
            }
            if metrics.is_some() {
                config.output.prometheus = metrics;
            }
            if fills.is_some() {
                config.output.fills = fills;
            }
            let app = pmm_bot::Application::new(config)?;
            info!(
                candles = %app.config().simulation.candles.display(),
                seed = app.config().simulation.seed,
                "Configuration loaded"
            );
            app.run()?;
        }
        Command::Sweep { output } => {
            if let Some(path) = output {
                config.sweep.output = path;
            }
            let app = pmm_bot::Application::new(config)?;
            let summaries = app.sweep().await?;
            info!(
                points = summaries.len(),
                output = %app.config().sweep.output.display(),
                "Sweep complete"
            );
        }
    }

    Ok(())
}
