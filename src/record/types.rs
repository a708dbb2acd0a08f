//! Telemetry record types and their wire layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header name to value. Repeated headers are joined with ", ".
pub type HeaderSnapshot = BTreeMap<String, String>;

/// One request/response cycle as sent to the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub api_key: String,
    pub project_id: String,
    /// Version of this crate.
    pub version: String,
    /// Originating runtime tag.
    pub sdk: String,
    pub data: RecordData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    pub server: ServerDescriptor,
    pub language: LanguageDescriptor,
    pub request: RequestDescriptor,
    pub response: ResponseDescriptor,
    pub errors: Vec<ErrorDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub timezone: String,
    pub os: OsDescriptor,
    /// e.g. "HTTP/1.1".
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsDescriptor {
    pub name: String,
    pub release: String,
    pub architecture: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDescriptor {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// UTC, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub ip: String,
    pub url: String,
    pub user_agent: String,
    pub method: String,
    pub headers: HeaderSnapshot,
    pub body: Value,
    /// Kilobytes.
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    pub headers: HeaderSnapshot,
    pub code: u16,
    /// Kilobytes.
    pub size: f64,
    /// Microseconds, rounded up.
    pub load_time: u64,
    pub body: Value,
}

/// Where an error was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSource {
    #[serde(rename = "onException")]
    OnException,
}

/// Error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "UNHANDLED_EXCEPTION")]
    UnhandledException,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub source: ErrorSource,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl ErrorDescriptor {
    /// Descriptor for an error that escaped the application handler.
    pub fn unhandled(message: impl Into<String>, file: Option<String>, line: Option<u32>) -> Self {
        Self {
            source: ErrorSource::OnException,
            kind: ErrorKind::UnhandledException,
            message: message.into(),
            file,
            line,
        }
    }
}
