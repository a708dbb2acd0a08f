//! End-to-end behavior of the telemetry interceptor.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::stream;
use serde_json::{json, Value};
use tower::ServiceExt;

use http_telemetry::{captured_error, TelemetryLayer};

mod common;

fn routes() -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "ok": true })) }))
        .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
        .route("/text", get(|| async { "plain text" }))
        .route(
            "/fail",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Extension(captured_error!("database unavailable")),
                    "try later",
                )
            }),
        )
        .route(
            "/stream",
            get(|| async {
                let chunks = vec![
                    Ok::<_, std::io::Error>("[1,"),
                    Ok("2,"),
                    Ok("3]"),
                ];
                Response::builder()
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from_stream(stream::iter(chunks)))
                    .unwrap()
            }),
        )
        .route(
            "/panic",
            get(|| async {
                if true {
                    panic!("handler exploded");
                }
                "unreachable"
            }),
        )
}

fn app(endpoint: &str) -> Router {
    let layer = TelemetryLayer::from_config(&common::config_for(endpoint)).unwrap();
    routes().layer(layer)
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

fn get_request(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::HOST, "api.test")
        .header(header::USER_AGENT, "integration/1.0")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_get_health_record() {
    let mut collector = common::start_collector(StatusCode::OK).await;

    let (status, _, body) = call(app(&collector.endpoint()), get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, br#"{"ok":true}"#);

    let received = collector.next().await;
    assert_eq!(received.api_key.as_deref(), Some("test-key"));
    assert_eq!(received.content_type.as_deref(), Some("application/json"));

    let record = received.record();
    assert_eq!(record["api_key"], "test-key");
    assert_eq!(record["project_id"], "test-project");

    let request = &record["data"]["request"];
    assert_eq!(request["method"], "GET");
    assert_eq!(request["url"], "http://api.test/health");
    assert_eq!(request["user_agent"], "integration/1.0");
    assert_eq!(request["body"], Value::Null);
    assert_eq!(request["size"], 0.0);

    let response = &record["data"]["response"];
    assert_eq!(response["code"], 200);
    assert_eq!(response["body"], json!({ "ok": true }));
    assert_eq!(response["size"].as_f64().unwrap(), 11.0 / 1024.0);
    assert!(response["load_time"].as_u64().is_some());

    assert_eq!(record["data"]["errors"], json!([]));
    assert_eq!(record["data"]["server"]["protocol"], "HTTP/1.1");
}

#[tokio::test]
async fn test_responses_are_identical_with_and_without_interceptor() {
    let collector = common::start_collector(StatusCode::OK).await;

    for path in ["/health", "/text", "/fail", "/stream", "/missing"] {
        let plain = call(routes(), get_request(path)).await;
        let observed = call(app(&collector.endpoint()), get_request(path)).await;
        assert_eq!(plain, observed, "response differs for {path}");
    }

    let echo = || {
        Request::builder()
            .method("POST")
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"widget","qty":3}"#))
            .unwrap()
    };
    assert_eq!(call(routes(), echo()).await, call(app(&collector.endpoint()), echo()).await);
}

#[tokio::test]
async fn test_post_body_and_sizes() {
    let mut collector = common::start_collector(StatusCode::OK).await;
    let payload = r#"{"name":"widget","qty":3}"#;

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .header(header::HOST, "api.test")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .unwrap();
    let (status, _, body) = call(app(&collector.endpoint()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, payload.as_bytes());

    let received = collector.next().await;
    let data = &received.record()["data"];
    assert_eq!(data["request"]["body"], json!({ "name": "widget", "qty": 3 }));
    assert_eq!(
        data["request"]["size"].as_f64().unwrap(),
        payload.len() as f64 / 1024.0
    );
    assert_eq!(data["request"]["headers"]["content-type"], "application/json");
    assert_eq!(data["response"]["body"], json!({ "name": "widget", "qty": 3 }));
    assert_eq!(
        data["response"]["size"].as_f64().unwrap(),
        payload.len() as f64 / 1024.0
    );
}

#[tokio::test]
async fn test_captured_error_yields_one_descriptor() {
    let mut collector = common::start_collector(StatusCode::OK).await;

    let (status, _, body) = call(app(&collector.endpoint()), get_request("/fail")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"try later");

    let received = collector.next().await;
    let data = &received.record()["data"];
    assert_eq!(data["response"]["code"], 500);
    assert_eq!(data["response"]["body"], "try later");

    let errors = data["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["source"], "onException");
    assert_eq!(errors[0]["type"], "UNHANDLED_EXCEPTION");
    assert_eq!(errors[0]["message"], "database unavailable");
    assert!(errors[0]["file"].as_str().unwrap().ends_with("interceptor_test.rs"));
    assert!(errors[0]["line"].as_u64().is_some());
}

#[tokio::test]
async fn test_streamed_body_is_captured_whole() {
    let mut collector = common::start_collector(StatusCode::OK).await;

    let (_, _, body) = call(app(&collector.endpoint()), get_request("/stream")).await;
    assert_eq!(body, b"[1,2,3]");

    let received = collector.next().await;
    let response = &received.record()["data"]["response"];
    assert_eq!(response["body"], json!([1, 2, 3]));
    assert_eq!(response["size"].as_f64().unwrap(), 7.0 / 1024.0);
}

#[tokio::test]
async fn test_oversized_response_body_is_not_captured() {
    let mut collector = common::start_collector(StatusCode::OK).await;
    let mut config = common::config_for(&collector.endpoint());
    config.capture.max_body_bytes = 4;
    let app = routes().layer(TelemetryLayer::from_config(&config).unwrap());

    let (_, _, body) = call(app, get_request("/text")).await;
    assert_eq!(body, b"plain text");

    let received = collector.next().await;
    let response = &received.record()["data"]["response"];
    assert_eq!(response["body"], Value::Null);
    assert_eq!(response["size"].as_f64().unwrap(), 10.0 / 1024.0);
}

#[tokio::test]
async fn test_oversized_request_body_reports_declared_size() {
    let mut collector = common::start_collector(StatusCode::OK).await;
    let mut config = common::config_for(&collector.endpoint());
    config.capture.max_body_bytes = 8;
    let app = routes().layer(TelemetryLayer::from_config(&config).unwrap());

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"widget","qty":3}"#))
        .unwrap();
    let (status, _, body) = call(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, br#"{"name":"widget","qty":3}"#);

    let received = collector.next().await;
    let request = &received.record()["data"]["request"];
    assert_eq!(request["body"], Value::Null);
    assert_eq!(request["size"].as_f64().unwrap(), 25.0 / 1024.0);
}

#[tokio::test]
async fn test_head_request_is_reported() {
    let mut collector = common::start_collector(StatusCode::OK).await;

    let request = Request::builder()
        .method("HEAD")
        .uri("/health")
        .header(header::HOST, "api.test")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = call(app(&collector.endpoint()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let received = collector.next().await;
    let record = received.record();
    assert_eq!(record["data"]["request"]["method"], "HEAD");

    let response = &record["data"]["response"];
    assert_eq!(response["code"], 200);
    assert_eq!(response["body"], Value::Null);
    assert_eq!(response["size"].as_f64().unwrap(), 11.0 / 1024.0);
    collector.assert_quiet(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_failing_request_body_reaches_handler_unchanged() {
    let collector = common::start_collector(StatusCode::OK).await;

    let broken = || {
        let chunks = vec![
            Ok::<_, std::io::Error>("{\"na"),
            Err(std::io::Error::other("connection reset")),
        ];
        Request::builder()
            .method("POST")
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, "25")
            .body(Body::from_stream(stream::iter(chunks)))
            .unwrap()
    };

    let plain = call(routes(), broken()).await;
    let observed = call(app(&collector.endpoint()), broken()).await;
    assert_eq!(plain.0, StatusCode::BAD_REQUEST);
    assert_eq!(plain, observed);
}

#[tokio::test]
async fn test_one_record_per_request() {
    let mut collector = common::start_collector(StatusCode::OK).await;
    let app = app(&collector.endpoint());

    for _ in 0..3 {
        call(app.clone(), get_request("/health")).await;
    }
    for _ in 0..3 {
        let received = collector.next().await;
        assert_eq!(received.record()["data"]["response"]["code"], 200);
    }
    collector.assert_quiet(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn test_unreachable_collector_does_not_affect_response() {
    // Nothing listens on this port.
    let app = app("http://127.0.0.1:9/ingest");

    let (status, _, body) = call(app, get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, br#"{"ok":true}"#);

    // Give the background task time to fail quietly.
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_rejecting_collector_does_not_affect_response() {
    let mut collector = common::start_collector(StatusCode::UNAUTHORIZED).await;

    let (status, _, body) = call(app(&collector.endpoint()), get_request("/text")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"plain text");

    // The record still went out once; the 401 was swallowed.
    let received = collector.next().await;
    assert_eq!(received.record()["data"]["response"]["body"], "plain text");
    collector.assert_quiet(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_panic_is_reported_and_resumed() {
    let mut collector = common::start_collector(StatusCode::OK).await;
    let app = app(&collector.endpoint());

    let outcome = tokio::spawn(async move { app.oneshot(get_request("/panic")).await }).await;
    let err = outcome.expect_err("panic should propagate");
    assert!(err.is_panic());

    let received = collector.next().await;
    let data = &received.record()["data"];
    assert_eq!(data["response"]["code"], 500);
    assert_eq!(data["errors"][0]["message"], "handler exploded");
    assert_eq!(data["errors"][0]["type"], "UNHANDLED_EXCEPTION");
}

#[tokio::test]
async fn test_load_time_tracks_handler_duration() {
    let mut collector = common::start_collector(StatusCode::OK).await;
    let app = Router::new()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                "done".into_response()
            }),
        )
        .layer(TelemetryLayer::from_config(&common::config_for(&collector.endpoint())).unwrap());

    call(app, get_request("/slow")).await;

    let received = collector.next().await;
    let load_time = received.record()["data"]["response"]["load_time"].as_u64().unwrap();
    assert!(load_time >= 50_000, "load_time {load_time}us shorter than handler");
}
