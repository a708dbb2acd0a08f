//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! interceptor / reporter
//!     → tracing events (diagnostics, transport failures)
//!     → metrics.rs (records built, reports by outcome)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout) in the binaries
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
