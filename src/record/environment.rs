//! Process-constant descriptors of the host.
//!
//! Detected once when the interceptor is built and shared by every record.

use sysinfo::System;

use crate::record::types::{LanguageDescriptor, OsDescriptor};

/// Runtime tag carried in every record.
pub const SDK_NAME: &str = "rust-axum";

/// Host facts that do not change for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub timezone: String,
    pub os: OsDescriptor,
    pub language: LanguageDescriptor,
    /// Crate version reported as the client version.
    pub client_version: String,
}

impl Environment {
    /// Inspect the running host.
    pub fn detect() -> Self {
        let os = OsDescriptor {
            name: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            release: System::kernel_version()
                .or_else(System::os_version)
                .unwrap_or_else(|| "unknown".to_string()),
            architecture: std::env::consts::ARCH.to_string(),
        };

        let env = Self {
            timezone: detect_timezone(),
            os,
            language: LanguageDescriptor {
                name: "rust".to_string(),
                version: env!("CARGO_PKG_RUST_VERSION").to_string(),
            },
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        tracing::debug!(
            os = %env.os.name,
            release = %env.os.release,
            timezone = %env.timezone,
            "Host environment detected"
        );
        env
    }
}

/// `TZ` when set, otherwise the local UTC offset (e.g. "+02:00").
fn detect_timezone() -> String {
    match std::env::var("TZ") {
        Ok(tz) if !tz.trim().is_empty() => tz,
        _ => chrono::Local::now().offset().to_string(),
    }
}
