//! Submission Gateway
//!
//! Public entry point in front of the file storage and analysis services.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  GATEWAY                     │
//!                         │                                              │
//!   Client Request        │  ┌────────┐   ┌─────────┐   ┌────────────┐   │
//!   ──────────────────────┼─▶│ server │──▶│ routing │──▶│ body codec │   │
//!                         │  └───┬────┘   └─────────┘   └─────┬──────┘   │
//!                         │      │ fixed endpoints            │          │
//!                         │      ▼                            ▼          │
//!                         │  ┌───────────────────┐     ┌────────────┐    │   ┌──────────┐
//!                         │  │ health / reports /│────▶│ dispatcher │────┼──▶│ upstream │
//!                         │  │ upload+analysis   │     └─────┬──────┘    │   └──────────┘
//!                         │  └───────────────────┘           │           │
//!   Client Response       │  ┌──────────┐                    │           │
//!   ◀─────────────────────┼──│ response │◀───────────────────┘           │
//!                         │  │  relay   │                                │
//!                         │  └──────────┘                                │
//!                         └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use submission_gateway::config::{load_config, validation::validate_config, GatewayConfig};
use submission_gateway::lifecycle::{signals, Shutdown};
use submission_gateway::observability::{init_logging, init_metrics};
use submission_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "submission-gateway", version, about = "API gateway for the submission services")]
struct Args {
    /// Path to a TOML config file. Defaults are used when absent.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        if let Err(errors) = validate_config(&config) {
            for e in &errors {
                eprintln!("invalid configuration: {}", e);
            }
            return Err(format!("{} configuration error(s)", errors.len()).into());
        }
    }

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "submission-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstreams = config.upstreams.len(),
        routes = config.routes.len(),
        max_body_bytes = config.limits.max_body_bytes,
        request_timeout_secs = config.client.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
