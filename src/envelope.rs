//! The authenticated payload carried by every cookie.
//!
//! A cookie value is never sealed on its own: it is wrapped together with the
//! logical key of the cookie that produced it,
//!
//! ```json
//! {"metadata":{"key":"cart","maxAge":86400},"value":["apple","pear"]}
//! ```
//!
//! so that a cookie can refuse a payload sealed by a different definition
//! sharing its name and keys. Object keys are sorted at every depth: two equal
//! values always produce the same bytes.
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Deserialize)]
struct Envelope {
    metadata: Metadata,
    value: Value,
}

#[derive(Deserialize)]
struct Metadata {
    key: String,
}

/// Serializes `value` inside an envelope bound to `key`.
pub(crate) fn encode(key: &str, max_age: Option<u64>, value: &Value) -> Option<Vec<u8>> {
    let mut metadata = Map::new();
    metadata.insert("key".into(), Value::String(key.into()));
    if let Some(max_age) = max_age {
        metadata.insert("maxAge".into(), Value::from(max_age));
    }

    let mut envelope = Map::new();
    envelope.insert("metadata".into(), Value::Object(metadata));
    envelope.insert("value".into(), value.clone());

    match serde_json::to_vec(&canonicalize(Value::Object(envelope))) {
        Ok(buffer) => Some(buffer),
        Err(e) => {
            tracing::trace!(error = ?e, cookie_key = key, "Failed to serialize a cookie envelope");
            None
        }
    }
}

/// Extracts the value from an envelope, if the envelope is well-formed and
/// bound to `key`.
pub(crate) fn decode(key: &str, buffer: &[u8]) -> Option<Value> {
    let payload: Value = match serde_json::from_slice(buffer) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::trace!(error = ?e, cookie_key = key, "Cookie payload is not valid JSON");
            return None;
        }
    };
    if is_polluting(&payload) {
        tracing::trace!(cookie_key = key, "Cookie payload contains a forbidden key");
        return None;
    }

    let envelope: Envelope = match serde_json::from_value(payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::trace!(error = ?e, cookie_key = key, "Cookie payload is not an envelope");
            return None;
        }
    };
    if envelope.metadata.key != key {
        tracing::trace!(
            cookie_key = key,
            envelope_key = %envelope.metadata.key,
            "Cookie payload belongs to another cookie"
        );
        return None;
    }
    Some(envelope.value)
}

/// Sorts object keys, recursively.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect::<BTreeMap<_, _>>()
                .into_iter()
                .collect(),
        ),
        other => other,
    }
}

/// `true` if `value` carries a `__proto__` key, or a `constructor` object with
/// a `prototype` key, at any depth.
fn is_polluting(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(is_polluting),
        Value::Object(map) => map.iter().any(|(k, v)| {
            k == "__proto__"
                || (k == "constructor"
                    && v.as_object().is_some_and(|c| c.contains_key("prototype")))
                || is_polluting(v)
        }),
        _ => false,
    }
}
