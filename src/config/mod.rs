//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TelemetryConfig (validated, immutable)
//!     → TelemetryLayer::from_config / demo server
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a file may carry only credentials
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config};
pub use schema::{
    CaptureConfig, Credentials, ObservabilityConfig, ReporterConfig, ServerConfig,
    TelemetryConfig, DEFAULT_COLLECTOR_ENDPOINT,
};
pub use validation::{validate_config, ValidationError};
