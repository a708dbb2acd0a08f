//! Tower layer wiring the interceptor around an inner service.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use tower::{Layer, Service};

use crate::config::{CaptureConfig, Credentials, ReporterConfig, TelemetryConfig};
use crate::error::TelemetryError;
use crate::interceptor::body::{BodySummary, ObservedBody};
use crate::interceptor::capture::{self, RequestSnapshot};
use crate::interceptor::context::CapturedError;
use crate::masking::{self, MaskingRules};
use crate::observability::metrics;
use crate::record::{
    payload, Environment, ErrorDescriptor, HeaderSnapshot, RequestDescriptor, ResponseDescriptor,
    TelemetryRecord,
};
use crate::reporter::Reporter;

/// Layer that reports every request passing through it.
///
/// Add it last (outermost) so it sees the final response:
///
/// ```ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(intercept(Credentials::new("api-key", "project-id"))?);
/// ```
#[derive(Clone)]
pub struct TelemetryLayer {
    interceptor: Interceptor,
}

impl TelemetryLayer {
    /// Layer reporting to the default collector.
    pub fn new(credentials: Credentials) -> Result<Self, TelemetryError> {
        let reporter = Reporter::new(&ReporterConfig::default(), &credentials)?;
        Ok(Self::with_reporter(credentials, reporter, CaptureConfig::default()))
    }

    /// Layer built from a loaded configuration.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let reporter = Reporter::new(&config.reporter, &config.credentials)?;
        Ok(Self::with_reporter(
            config.credentials.clone(),
            reporter,
            config.capture.clone(),
        ))
    }

    /// Layer using an existing reporter.
    pub fn with_reporter(credentials: Credentials, reporter: Reporter, capture: CaptureConfig) -> Self {
        Self {
            interceptor: Interceptor {
                shared: Arc::new(Shared {
                    credentials,
                    environment: Environment::detect(),
                    reporter,
                    max_body_bytes: capture.max_body_bytes,
                    masking: capture.masking,
                }),
            },
        }
    }
}

impl<S> Layer<S> for TelemetryLayer {
    type Service = TelemetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TelemetryService {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

/// Service produced by [`TelemetryLayer`].
#[derive(Clone)]
pub struct TelemetryService<S> {
    inner: S,
    interceptor: Interceptor,
}

impl<S, ResBody> Service<Request<Body>> for TelemetryService<S>
where
    S: Service<Request<Body>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: http_body::Body<Data = bytes::Bytes> + Send + 'static,
    ResBody::Error: Into<axum::BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let interceptor = self.interceptor.clone();
        Box::pin(interceptor.observe(request, inner))
    }
}

#[derive(Clone)]
struct Interceptor {
    shared: Arc<Shared>,
}

struct Shared {
    credentials: Credentials,
    environment: Environment,
    reporter: Reporter,
    max_body_bytes: usize,
    masking: MaskingRules,
}

impl Interceptor {
    async fn observe<S, ResBody>(
        self,
        request: Request<Body>,
        mut service: S,
    ) -> Result<Response<Body>, S::Error>
    where
        S: Service<Request<Body>, Response = Response<ResBody>>,
        ResBody: http_body::Body<Data = bytes::Bytes> + Send + 'static,
        ResBody::Error: Into<axum::BoxError>,
    {
        let started = Instant::now();
        let (request, snapshot) =
            capture::snapshot_request(request, self.shared.max_body_bytes).await;

        let served = AssertUnwindSafe(async move { service.call(request).await })
            .catch_unwind()
            .await;

        match served {
            Ok(Ok(response)) => Ok(self.track(response, snapshot, started)),
            Ok(Err(e)) => {
                tracing::debug!(url = %snapshot.url, "Inner service failed; no response to report");
                Err(e)
            }
            Err(panic) => {
                let error = CapturedError::from_panic(panic.as_ref());
                tracing::warn!(url = %snapshot.url, message = %error.message, "Handler panicked");
                self.report_panic(snapshot, started, error);
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// Swap in an observed body; the record is built once it has been emitted.
    fn track<B>(&self, response: Response<B>, request: RequestSnapshot, started: Instant) -> Response<Body>
    where
        B: http_body::Body<Data = bytes::Bytes> + Send + 'static,
        B::Error: Into<axum::BoxError>,
    {
        let (parts, body) = response.into_parts();

        // Replies to HEAD carry no body; the server may drop it unpolled.
        let head = request.method == Method::HEAD.as_str();
        let mut content_length = capture::content_length(&parts.headers);
        if head && content_length.is_none() {
            content_length = body
                .size_hint()
                .exact()
                .and_then(|len| usize::try_from(len).ok());
        }

        let pending = PendingRecord {
            interceptor: self.clone(),
            request,
            head,
            status: parts.status.as_u16(),
            headers: capture::snapshot_headers(&parts.headers),
            content_length,
            error: parts.extensions.get::<CapturedError>().cloned(),
            started,
        };

        let body = ObservedBody::new(
            body,
            self.shared.max_body_bytes,
            Box::new(move |summary| pending.complete(summary)),
        );
        let body = if head { body.complete_on_drop() } else { body };
        Response::from_parts(parts, Body::new(body))
    }

    fn report_panic(&self, request: RequestSnapshot, started: Instant, error: CapturedError) {
        let response = ResponseDescriptor {
            headers: HeaderSnapshot::new(),
            code: 500,
            size: 0.0,
            load_time: payload::elapsed_micros(started.elapsed()),
            body: Value::Null,
        };
        let record = self.build_record(request, response, vec![error.to_descriptor()]);
        self.shared.reporter.report(record);
    }

    fn build_record(
        &self,
        request: RequestSnapshot,
        mut response: ResponseDescriptor,
        errors: Vec<ErrorDescriptor>,
    ) -> TelemetryRecord {
        let rules = &self.shared.masking;
        let descriptor = RequestDescriptor {
            timestamp: request.timestamp,
            ip: request.ip,
            url: request.url,
            user_agent: request.user_agent,
            method: request.method,
            headers: mask_headers(request.headers, rules),
            body: masking::mask(request.body, rules),
            size: payload::to_kilobytes(request.body_len),
        };
        response.headers = mask_headers(response.headers, rules);
        response.body = masking::mask(response.body, rules);

        metrics::record_built();
        TelemetryRecord::new(
            &self.shared.credentials,
            &self.shared.environment,
            request.protocol,
            descriptor,
            response,
            errors,
        )
    }
}

fn mask_headers(headers: HeaderSnapshot, rules: &MaskingRules) -> HeaderSnapshot {
    let value = match serde_json::to_value(&headers) {
        Ok(value) => value,
        Err(_) => return headers,
    };
    serde_json::from_value(masking::mask(value, rules)).unwrap_or(headers)
}

/// Everything known about a request once its response head exists.
struct PendingRecord {
    interceptor: Interceptor,
    request: RequestSnapshot,
    head: bool,
    status: u16,
    headers: HeaderSnapshot,
    content_length: Option<usize>,
    error: Option<CapturedError>,
    started: Instant,
}

impl PendingRecord {
    fn complete(self, body: BodySummary) {
        let load_time = payload::elapsed_micros(self.started.elapsed());
        let size = self.content_length.unwrap_or(body.total_bytes);
        let body_value = if self.head || body.overflowed {
            Value::Null
        } else {
            payload::body_value(&body.captured)
        };

        let response = ResponseDescriptor {
            headers: self.headers,
            code: self.status,
            size: payload::to_kilobytes(size),
            load_time,
            body: body_value,
        };
        let errors = self.error.iter().map(CapturedError::to_descriptor).collect();

        tracing::trace!(
            method = %self.request.method,
            url = %self.request.url,
            status = self.status,
            load_time_us = load_time,
            "Request completed"
        );

        let record = self.interceptor.build_record(self.request, response, errors);
        self.interceptor.shared.reporter.report(record);
    }
}
