//! Body and size helpers shared by the interceptor and the record builder.

use std::time::Duration;

use serde_json::Value;

/// Interpret captured body bytes.
///
/// JSON bodies are kept as JSON, other UTF-8 text becomes a string, and
/// empty or binary bodies become null.
pub fn body_value(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        return value;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::Null,
    }
}

/// Byte length of the JSON serialization of a body. Null bodies count as zero.
pub fn serialized_len(body: &Value) -> usize {
    match body {
        Value::Null => 0,
        Value::String(text) => text.len(),
        other => serde_json::to_vec(other).map(|v| v.len()).unwrap_or(0),
    }
}

/// Bytes to kilobytes.
pub fn to_kilobytes(bytes: usize) -> f64 {
    bytes as f64 / 1024.0
}

/// Elapsed time in whole microseconds, rounded up.
pub fn elapsed_micros(elapsed: Duration) -> u64 {
    let micros = elapsed.as_nanos().div_ceil(1000);
    u64::try_from(micros).unwrap_or(u64::MAX)
}
