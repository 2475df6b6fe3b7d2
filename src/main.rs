//! Edge relay entrypoint.
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 EDGE RELAY                   │
//!                        │                                              │
//!   Client Request       │  ┌──────┐   ┌──────────┐   ┌─────────────┐  │
//!   ────────────────────▶│  │ cors │──▶│  server  │──▶│  pipeline   │  │
//!   ?destination=<url>   │  └──────┘   └──────────┘   │ gate→fetch  │  │
//!                        │                            │  →dispatch  │  │
//!   Client Response      │  ┌──────────────────────┐  └──────┬──────┘  │
//!   ◀────────────────────│──│ sanitized response   │◀────────┘         │──▶ Destination
//!                        │  └──────────────────────┘                   │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_relay::config::loader::load_config;
use edge_relay::config::RelayConfig;
use edge_relay::http::HttpServer;
use edge_relay::lifecycle::Shutdown;
use edge_relay::observability::{logging, metrics};

/// Edge relay: a gated, sanitizing proxy for arbitrary destinations.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = config.relay.mode.as_str(),
        gate = ?config.gate.mode,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
