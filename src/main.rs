//! S3 Traffic-Accounting Gateway
//!
//! A request-classification and traffic-accounting layer in front of an
//! S3-compatible object API, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │               STATS GATEWAY                     │
//!                      │                                                 │
//!  Client Request      │  ┌─────────┐    ┌──────────┐    ┌───────────┐  │
//!  ────────────────────┼─▶│  http   │───▶│  track   │───▶│ handlers  │  │
//!                      │  │ server  │    │decorator │    │ + storage │  │
//!                      │  └─────────┘    └────┬─────┘    └─────┬─────┘  │
//!                      │                      │                │        │
//!                      │                      ▼                ▼        │
//!                      │               ┌────────────┐   ┌────────────┐  │
//!                      │               │  classify  │   │  traffic   │  │
//!                      │               │ (op, CIDR) │   │  recorder  │  │
//!                      │               └────────────┘   └────────────┘  │
//!                      │                      │                │        │
//!                      │                      ▼                ▼        │
//!                      │               ┌────────────────────────────┐   │
//!                      │               │  metrics sink (Prometheus) │   │
//!                      │               └────────────────────────────┘   │
//!                      └────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use tokio::net::TcpListener;

use s3_stats_gateway::config::{loader, GatewayConfig};
use s3_stats_gateway::http::HttpServer;
use s3_stats_gateway::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::logging::init();

    tracing::info!("s3-stats-gateway starting");

    // Optional config file as the first argument; defaults otherwise.
    let mut config = match std::env::args().nth(1) {
        Some(path) => loader::load_config(Path::new(&path))?,
        None => GatewayConfig::default(),
    };
    loader::apply_env_overrides(&mut config);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.listener.request_timeout_secs,
        internal_cidrs = %config.network.internal_cidrs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_exporter(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
