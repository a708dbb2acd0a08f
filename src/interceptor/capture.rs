//! Request snapshotting.
//!
//! # Responsibilities
//! - Describe the inbound request (URL, client IP, headers, protocol)
//! - Buffer a bounded request body and hand identical bytes downstream

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::{ConnectInfo, OriginalUri};
use axum::http::{header, request, HeaderMap, Request, Version};
use bytes::{Bytes, BytesMut};
use futures_util::stream;
use http_body::{Body as _, Frame};
use http_body_util::{BodyExt, StreamBody};
use serde_json::Value;

use crate::record::payload;
use crate::record::HeaderSnapshot;

/// What the interceptor knows about a request before it is served.
#[derive(Debug, Clone)]
pub(crate) struct RequestSnapshot {
    pub timestamp: String,
    pub ip: String,
    pub url: String,
    pub user_agent: String,
    pub method: String,
    pub headers: HeaderSnapshot,
    pub protocol: String,
    pub body: Value,
    /// Serialized body length in bytes, or the declared length when the body
    /// was not captured.
    pub body_len: usize,
}

/// Snapshot the request and rebuild it with the same body bytes.
pub(crate) async fn snapshot_request(
    request: Request<Body>,
    capture_limit: usize,
) -> (Request<Body>, RequestSnapshot) {
    let (parts, body) = request.into_parts();

    let (body, value, body_len) = buffer_body(&parts, body, capture_limit).await;
    let snapshot = RequestSnapshot {
        timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ip: client_ip(&parts),
        url: request_url(&parts),
        user_agent: header_str(&parts.headers, header::USER_AGENT.as_str())
            .unwrap_or_default()
            .to_string(),
        method: parts.method.to_string(),
        headers: snapshot_headers(&parts.headers),
        protocol: protocol(parts.version),
        body: value,
        body_len,
    };

    (Request::from_parts(parts, body), snapshot)
}

/// Read the body when its size is known and within `limit`.
///
/// Returns the body to hand downstream, the captured value, and the body
/// length to report. Bodies of unknown or excessive size are forwarded
/// untouched, recorded as null, and sized by their declared length.
async fn buffer_body(parts: &request::Parts, body: Body, limit: usize) -> (Body, Value, usize) {
    let declared = body.size_hint().exact().or_else(|| {
        header_str(&parts.headers, header::CONTENT_LENGTH.as_str()).and_then(|v| v.parse().ok())
    });
    let declared_len = declared.map_or(0, |len| usize::try_from(len).unwrap_or(usize::MAX));

    match declared {
        Some(len) if len > 0 && len <= limit as u64 => {}
        _ => return (body, Value::Null, declared_len),
    }

    let mut body = body;
    let mut frames = Vec::new();
    let mut data = BytesMut::new();
    let mut trailers = false;
    loop {
        match body.frame().await {
            Some(Ok(frame)) => {
                match frame.data_ref() {
                    Some(chunk) => data.extend_from_slice(chunk),
                    None => trailers = true,
                }
                frames.push(Ok(frame));
            }
            Some(Err(e)) => {
                // The handler sees the same bytes followed by the same failure.
                tracing::warn!(error = %e, "Request body failed while buffering for telemetry");
                frames.push(Err(e));
                return (replay(frames), Value::Null, declared_len);
            }
            None => break,
        }
    }

    let value = payload::body_value(&data);
    let len = payload::serialized_len(&value);
    if trailers {
        (replay(frames), value, len)
    } else {
        (Body::from(data.freeze()), value, len)
    }
}

fn replay(frames: Vec<Result<Frame<Bytes>, axum::Error>>) -> Body {
    Body::new(StreamBody::new(stream::iter(frames)))
}

/// Header snapshot. Repeated headers are joined with ", ".
pub(crate) fn snapshot_headers(headers: &HeaderMap) -> HeaderSnapshot {
    let mut snapshot = HeaderSnapshot::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        snapshot.insert(name.as_str().to_string(), joined);
    }
    snapshot
}

/// `Content-Length` header as a number.
pub(crate) fn content_length(headers: &HeaderMap) -> Option<usize> {
    header_str(headers, header::CONTENT_LENGTH.as_str()).and_then(|v| v.trim().parse().ok())
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// peer address when the server exposes it.
fn client_ip(parts: &request::Parts) -> String {
    let forwarded = header_str(&parts.headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| ip.parse::<IpAddr>().is_ok());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = header_str(&parts.headers, "x-real-ip")
        .map(str::trim)
        .filter(|ip| ip.parse::<IpAddr>().is_ok());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Absolute URL as the client addressed it.
fn request_url(parts: &request::Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or(&parts.uri);

    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.to_string();
    }

    let scheme = header_str(&parts.headers, "x-forwarded-proto").unwrap_or("http");
    let host = header_str(&parts.headers, header::HOST.as_str())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    format!("{scheme}://{host}{path}")
}

fn protocol(version: Version) -> String {
    format!("{version:?}")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
