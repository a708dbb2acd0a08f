//! Error definitions.

use thiserror::Error;

use crate::config::ValidationError;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for the schema.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config parsed but failed semantic checks.
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur while transmitting a record to the collector.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The collector endpoint is not a usable URL.
    #[error("Invalid collector endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Network failure or timeout.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collector answered with a non-success status.
    #[error("Collector rejected record with status {0}")]
    Rejected(u16),

    /// No async runtime to run the transmission on.
    #[error("No tokio runtime available for background reporting")]
    NoRuntime,
}

/// Top-level error for fallible construction of the telemetry stack.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Result type for reporter operations.
pub type ReportResult<T> = Result<T, ReportError>;
