//! Request/response telemetry for axum and tower services.
//!
//! Every request passing through [`TelemetryLayer`] is described in a
//! [`TelemetryRecord`] (request, response, timing, errors) which is sent in
//! the background to a collector. Telemetry never changes the response and
//! never fails the request.
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use http_telemetry::{intercept, Credentials};
//!
//! let app = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(intercept(Credentials::new("api-key", "project-id"))?);
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod lifecycle;
pub mod masking;
pub mod observability;
pub mod record;
pub mod reporter;

pub use config::{Credentials, TelemetryConfig};
pub use error::{ConfigError, ReportError, TelemetryError};
pub use interceptor::{intercept, CapturedError, TelemetryLayer, TelemetryService};
pub use record::TelemetryRecord;
pub use reporter::Reporter;
