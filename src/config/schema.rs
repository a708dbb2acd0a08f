//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Every
//! section has defaults so a config file only needs the credentials.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Collector endpoint used when the config does not name one.
pub const DEFAULT_COLLECTOR_ENDPOINT: &str = "https://collector.http-telemetry.dev/v1/records";

/// Root configuration for the telemetry interceptor and the demo server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Credentials attached to every record.
    pub credentials: Credentials,

    /// Outbound reporter settings.
    pub reporter: ReporterConfig,

    /// Request/response capture settings.
    pub capture: CaptureConfig,

    /// Demo server listener.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Caller-supplied credentials. Neither field is validated.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Credentials {
    /// API key, sent in the payload and in the `x-api-key` header.
    pub api_key: String,

    /// Project identifier.
    pub project_id: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
        }
    }
}

/// Reporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Collector URL receiving the JSON payload.
    pub endpoint: String,

    /// Upper bound for a single transmission, in seconds.
    pub timeout_secs: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COLLECTOR_ENDPOINT.to_string(),
            timeout_secs: 5,
        }
    }
}

/// Capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Bodies larger than this are forwarded untouched and recorded as null.
    pub max_body_bytes: usize,

    /// Field name to masking rule. Passed to the masking helper.
    pub masking: BTreeMap<String, String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            masking: BTreeMap::new(),
        }
    }
}

/// Demo server listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
