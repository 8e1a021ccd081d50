//! Lane Duel - Entry Point
//!
//! Loads configuration, sets up logging and serves the WebSocket gateway
//! until ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use lane_duel::core::config::AppConfig;
use lane_duel::core::error::Result;
use lane_duel::server;
use lane_duel::session::SessionManager;

#[derive(Parser, Debug)]
#[command(name = "lane-duel")]
#[command(about = "Serve the speed duel experiment over WebSocket")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Seed for opponent strategy selection (overrides config)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lane_duel=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_toml(path)?,
        None => AppConfig::default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.seed.is_some() {
        config.duel.seed = args.seed;
    }
    config.validate()?;

    tracing::info!(
        rounds = config.duel.total_rounds,
        tick_rate = config.duel.tick_rate,
        seeded = config.duel.seed.is_some(),
        "Lane Duel starting..."
    );

    let manager = Arc::new(SessionManager::new(config.duel, config.server.clone()));
    server::serve(&config.server, manager).await
}
