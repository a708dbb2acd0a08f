//! Demo handlers exercising the interceptor.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::{json, Value};

use crate::captured_error;

/// `GET /health` → `{"ok":true}`.
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// `POST /echo` → the request JSON, unchanged.
pub async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

/// `GET /fail` → 500 with an error attached for telemetry.
pub async fn fail() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Extension(captured_error!("simulated failure")),
        Json(json!({ "error": "internal error" })),
    )
}

/// `GET /text` → plain text body.
pub async fn text() -> &'static str {
    "hello from http-telemetry"
}
