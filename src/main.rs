//! Demo server for the telemetry interceptor.
//!
//! ```text
//!   client ──▶ TelemetryLayer ──▶ TraceLayer ──▶ TimeoutLayer ──▶ handlers
//!                  │
//!                  └── body emitted ──▶ Reporter ──(spawned POST)──▶ collector
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use http_telemetry::config::{load_config, TelemetryConfig};
use http_telemetry::http::HttpServer;
use http_telemetry::lifecycle::Shutdown;
use http_telemetry::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "http-telemetry")]
#[command(about = "Demo server reporting every request to a telemetry collector", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TelemetryConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("http-telemetry v{} starting", env!("CARGO_PKG_VERSION"));

    if config.credentials.api_key.is_empty() {
        tracing::warn!("No API key configured; the collector will likely reject records");
    }

    tracing::info!(
        bind_address = %config.server.bind_address,
        endpoint = %config.reporter.endpoint,
        max_body_bytes = config.capture.max_body_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
