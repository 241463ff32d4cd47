//! Profile aggregator
//!
//! ```text
//!   GET /user/{username}
//!          │
//!          ▼
//!   ┌─────────────┐     ┌──────────────────────────────────────────────┐
//!   │ http server │────▶│ ProfileService (fan-out / fan-in)            │
//!   └─────────────┘     │   ├─ fetch_user  → cache → retry → transport ─┼──▶ upstream API
//!                       │   └─ fetch_repos → cache → retry → transport ─┼──▶ upstream API
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use profile_aggregator::config::{load_config, AppConfig};
use profile_aggregator::lifecycle::{wait_for_signal, Shutdown};
use profile_aggregator::observability::{logging, metrics};
use profile_aggregator::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "profile-aggregator", version, about = "Serves user profiles with their repositories")]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "profile-aggregator starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        upstream = %config.upstream.base_url,
        max_attempts = config.retry.max_attempts,
        user_ttl_ms = config.cache.user_ttl_ms,
        repos_ttl_ms = config.cache.repos_ttl_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::from_config(&config)?;

    let shutdown = Shutdown::new();
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await?;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
