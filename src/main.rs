//! steer — a reverse-proxy load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌───────────────────────────────────────────────┐
//!                   │                    STEER                      │
//!                   │                                               │
//!  Client Request   │  ┌────────┐   ┌───────────┐   ┌────────────┐  │
//!  ─────────────────┼─▶│  http  │──▶│  balancer │──▶│  backend   │──┼──▶ Backend
//!                   │  │ server │   │  pool +   │   │ connection │  │    Server
//!                   │  └────────┘   │ strategy  │   └────────────┘  │
//!                   │       │       └─────┬─────┘                   │
//!  Control Request  │  ┌────────┐         │      ┌──────────────┐   │
//!  ─────────────────┼─▶│control │─────────┤      │    stats     │   │
//!                   │  │  api   │         └─────▶│  aggregator  │   │
//!                   │  └────────┘                └──────────────┘   │
//!                   │                                               │
//!                   │  ┌─────────────────────────────────────────┐  │
//!                   │  │          Cross-Cutting Concerns         │  │
//!                   │  │  ┌────────┐ ┌────────┐ ┌─────────────┐  │  │
//!                   │  │  │ config │ │ health │ │observability│  │  │
//!                   │  │  │        │ │ prober │ │             │  │  │
//!                   │  │  └────────┘ └────────┘ └─────────────┘  │  │
//!                   │  └─────────────────────────────────────────┘  │
//!                   └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use steer::balancer::backend::parse_backend_url;
use steer::balancer::pool::BackendPool;
use steer::config::{load_config, BalancerConfig};
use steer::http::HttpServer;
use steer::lifecycle::Shutdown;
use steer::observability;

#[derive(Parser)]
#[command(name = "steer")]
#[command(about = "Reverse-proxy load balancer", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener port from the config.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    observability::logging::init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "steer starting");

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };
    if let Some(port) = cli.port {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        config.listener.bind_address = format!("{host}:{port}");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        strategy = %config.strategy.algorithm,
        probe_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Seed the pool from config; the config is pre-validated, so a
    // failure here is a real startup error.
    let pool = Arc::new(BackendPool::new());
    for seed in &config.backends {
        pool.add(parse_backend_url(&seed.url)?, seed.weight)?;
    }
    pool.set_strategy(&config.strategy.algorithm)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, pool);
    server.run(listener, Shutdown::new()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
