//! Lifecycle management for the demo server.
//!
//! Shutdown is triggered either by Ctrl+C or programmatically through
//! [`Shutdown::trigger`] (tests). In-flight responses are drained by axum's
//! graceful shutdown; telemetry tasks still pending at exit are lost.

pub mod shutdown;

pub use shutdown::Shutdown;
