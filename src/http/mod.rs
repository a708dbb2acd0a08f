//! Demo HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → TelemetryLayer (outermost)
//!     → TraceLayer / TimeoutLayer
//!     → handlers.rs
//! ```

pub mod handlers;
pub mod server;

pub use server::HttpServer;
