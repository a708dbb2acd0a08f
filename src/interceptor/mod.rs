//! Request interceptor.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → capture.rs (start instant, request snapshot, body buffered and replayed)
//!     → inner service (handlers run unchanged)
//!     → body.rs (response body wrapped, bytes teed while streaming)
//!     → body fully emitted: record built (masking applied)
//!     → reporter (spawned, never awaited by the request)
//! ```
//!
//! # Design Decisions
//! - The response is decorated by composition; status, headers and bytes
//!   reach the client exactly as the inner service produced them
//! - Errors travel from handlers in response extensions ([`CapturedError`])
//! - Handler panics are reported and then resumed

pub mod body;
mod capture;
pub mod context;
pub mod layer;

pub use body::{BodySummary, ObservedBody};
pub use context::CapturedError;
pub use layer::{TelemetryLayer, TelemetryService};

use crate::config::Credentials;
use crate::error::TelemetryError;

/// Build the interceptor layer for the given credentials.
pub fn intercept(credentials: Credentials) -> Result<TelemetryLayer, TelemetryError> {
    TelemetryLayer::new(credentials)
}
