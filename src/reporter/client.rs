//! Collector client.
//!
//! # Responsibilities
//! - Serialize a record as a single-element JSON array
//! - POST it with the API key header, bounded by a timeout
//! - Run transmissions in the background and swallow their failures

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

use crate::config::{Credentials, ReporterConfig};
use crate::error::{ReportError, ReportResult};
use crate::observability::metrics::{self, ReportOutcome};
use crate::record::TelemetryRecord;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Best-effort, fire-and-forget transmitter of telemetry records.
#[derive(Clone)]
pub struct Reporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl Reporter {
    /// Create a reporter for the given collector settings.
    pub fn new(config: &ReporterConfig, credentials: &Credentials) -> ReportResult<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| ReportError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReportError::Client(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ReporterInner {
                client,
                endpoint,
                api_key: credentials.api_key.clone(),
            }),
        })
    }

    /// Collector URL.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Transmit a record in the background. Never fails and never blocks.
    pub fn report(&self, record: TelemetryRecord) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::error!(error = %ReportError::NoRuntime, "Dropping telemetry record");
                return;
            }
        };

        let reporter = self.clone();
        handle.spawn(async move {
            if let Err(e) = reporter.send(&record).await {
                tracing::warn!(
                    endpoint = %reporter.inner.endpoint,
                    method = %record.data.request.method,
                    url = %record.data.request.url,
                    error = %e,
                    "Failed to deliver telemetry record"
                );
            }
        });
    }

    /// Transmit a record once and wait for the collector's answer.
    pub async fn send(&self, record: &TelemetryRecord) -> ReportResult<()> {
        let started = Instant::now();
        let result = self.post(record).await;

        let outcome = if result.is_ok() {
            ReportOutcome::Sent
        } else {
            ReportOutcome::Failed
        };
        metrics::record_report(outcome, started);
        result
    }

    async fn post(&self, record: &TelemetryRecord) -> ReportResult<()> {
        let batch = std::slice::from_ref(record);
        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header(API_KEY_HEADER, self.api_key_header())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(batch)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Rejected(status.as_u16()));
        }

        tracing::debug!(
            endpoint = %self.inner.endpoint,
            status = %status,
            "Telemetry record delivered"
        );
        Ok(())
    }

    fn api_key_header(&self) -> HeaderValue {
        HeaderValue::from_str(&self.inner.api_key).unwrap_or_else(|_| {
            tracing::warn!("API key is not a valid header value; sending it empty");
            HeaderValue::from_static("")
        })
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("endpoint", &self.inner.endpoint.as_str())
            .finish_non_exhaustive()
    }
}
