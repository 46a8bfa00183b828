//! Ladder market maker - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Ladder market maker
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LADDER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Stop after this many ticks, leaving resting orders in place
    #[arg(short, long)]
    iterations: Option<u64>,

    /// Drive the paper venue with the random-walk market simulator
    #[arg(long)]
    sim: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    ladder_telemetry::init_logging()?;

    info!("Starting ladder bot v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > LADDER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("LADDER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = ladder_bot::AppConfig::from_file(&config_path)?;
    if args.iterations.is_some() {
        config.trader.fixed_iterations = args.iterations;
    }
    if args.sim {
        config.sim.enabled = true;
    }
    config.validate()?;
    info!(pair = %config.pair, strategy = %config.strategy.name, "Configuration loaded");

    let mut app = ladder_bot::Application::new(config)?;
    let shutdown = ladder_bot::shutdown_on_ctrl_c();
    let stats = app.run(shutdown).await?;

    info!(successes = stats.successes, failures = stats.failures, "Stopped");
    Ok(())
}
