//! Reporter subsystem.
//!
//! # Data Flow
//! ```text
//! TelemetryRecord
//!     → Reporter::report (spawned task, result never awaited by the request)
//!     → Reporter::send (JSON array of one record, x-api-key header)
//!     → collector
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt per record: no retry, backoff or batching
//! - Failures are logged and counted, never propagated

pub mod client;

pub use client::{Reporter, API_KEY_HEADER};
