//! Telemetry record model.
//!
//! # Data Flow
//! ```text
//! interceptor (request snapshot + observed response)
//!     → payload.rs (body interpretation, sizes, timing)
//!     → TelemetryRecord::new (with environment.rs descriptors)
//!     → reporter
//! ```

pub mod environment;
pub mod payload;
pub mod types;

pub use environment::{Environment, SDK_NAME};
pub use types::{
    ErrorDescriptor, ErrorKind, ErrorSource, HeaderSnapshot, LanguageDescriptor, OsDescriptor,
    RecordData, RequestDescriptor, ResponseDescriptor, ServerDescriptor, TelemetryRecord,
};

use crate::config::Credentials;

impl TelemetryRecord {
    /// Assemble a record from its parts.
    pub fn new(
        credentials: &Credentials,
        environment: &Environment,
        protocol: impl Into<String>,
        request: RequestDescriptor,
        response: ResponseDescriptor,
        errors: Vec<ErrorDescriptor>,
    ) -> Self {
        Self {
            api_key: credentials.api_key.clone(),
            project_id: credentials.project_id.clone(),
            version: environment.client_version.clone(),
            sdk: SDK_NAME.to_string(),
            data: RecordData {
                server: ServerDescriptor {
                    timezone: environment.timezone.clone(),
                    os: environment.os.clone(),
                    protocol: protocol.into(),
                },
                language: environment.language.clone(),
                request,
                response,
                errors,
            },
        }
    }
}
