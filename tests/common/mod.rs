//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use http_telemetry::config::{Credentials, TelemetryConfig};

/// One POST received by the mock collector.
#[derive(Debug)]
pub struct Received {
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub payload: Value,
}

impl Received {
    /// The single record in the payload array.
    pub fn record(&self) -> &Value {
        let batch = self.payload.as_array().expect("payload is not an array");
        assert_eq!(batch.len(), 1, "payload should carry exactly one record");
        &batch[0]
    }
}

/// Collector stand-in answering every POST with a fixed status.
pub struct MockCollector {
    pub addr: SocketAddr,
    rx: mpsc::UnboundedReceiver<Received>,
}

#[derive(Clone)]
struct CollectorState {
    tx: mpsc::UnboundedSender<Received>,
    status: StatusCode,
}

async fn ingest(
    State(state): State<CollectorState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> StatusCode {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let _ = state.tx.send(Received {
        api_key: header("x-api-key"),
        content_type: header("content-type"),
        payload,
    });
    state.status
}

/// Start a mock collector on an ephemeral port.
pub async fn start_collector(status: StatusCode) -> MockCollector {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    let app = Router::new()
        .route("/ingest", post(ingest))
        .with_state(CollectorState { tx, status });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockCollector { addr, rx }
}

impl MockCollector {
    pub fn endpoint(&self) -> String {
        format!("http://{}/ingest", self.addr)
    }

    /// Wait for the next transmission.
    pub async fn next(&mut self) -> Received {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("no telemetry received within 5s")
            .expect("collector channel closed")
    }

    /// Assert nothing else arrives for `wait`.
    pub async fn assert_quiet(&mut self, wait: Duration) {
        if let Ok(Some(extra)) = tokio::time::timeout(wait, self.rx.recv()).await {
            panic!("unexpected extra telemetry: {:?}", extra.payload);
        }
    }
}

/// Config pointing at `endpoint` with test credentials.
pub fn config_for(endpoint: &str) -> TelemetryConfig {
    let mut config = TelemetryConfig::default();
    config.credentials = Credentials::new("test-key", "test-project");
    config.reporter.endpoint = endpoint.to_string();
    config.reporter.timeout_secs = 2;
    config
}
