//! Demo HTTP server.
//!
//! # Responsibilities
//! - Create the Axum router with the demo handlers
//! - Wire middleware (timeout, tracing, telemetry outermost)
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::TelemetryConfig;
use crate::error::TelemetryError;
use crate::http::handlers;
use crate::interceptor::TelemetryLayer;
use crate::lifecycle::shutdown::signal_or;

/// Demo server with the telemetry interceptor installed.
pub struct HttpServer {
    router: Router,
    config: TelemetryConfig,
}

impl HttpServer {
    pub fn new(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        let telemetry = TelemetryLayer::from_config(&config)?;
        let router = Self::build_router(&config, telemetry);
        Ok(Self { router, config })
    }

    /// The telemetry layer is added last so it wraps everything else.
    #[allow(deprecated)]
    fn build_router(config: &TelemetryConfig, telemetry: TelemetryLayer) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/echo", post(handlers::echo))
            .route("/fail", get(handlers::fail))
            .route("/text", get(handlers::text))
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(telemetry)
    }

    /// Serve on `listener` until Ctrl+C or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(signal_or(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}
