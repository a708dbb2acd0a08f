//! Report counters.
//!
//! # Metrics
//! - `telemetry_records_built_total` (counter): records assembled
//! - `telemetry_reports_total` (counter): transmissions by outcome (sent, failed)
//! - `telemetry_report_duration_seconds` (histogram): collector round-trip

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome of one transmission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Sent,
    Failed,
}

impl ReportOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportOutcome::Sent => "sent",
            ReportOutcome::Failed => "failed",
        }
    }
}

/// Count an assembled record.
pub fn record_built() {
    counter!("telemetry_records_built_total").increment(1);
}

/// Count a transmission and its duration.
pub fn record_report(outcome: ReportOutcome, started: Instant) {
    counter!("telemetry_reports_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("telemetry_report_duration_seconds").record(started.elapsed().as_secs_f64());
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}
