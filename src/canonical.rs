//! Canonical JSON encoding: recursively key-sorted objects, no insignificant
//! whitespace. Observation and action equality are defined over this form.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::hashing::sha256_hex;

#[derive(Debug, Error)]
pub enum CanonicalError {
    #[error("value is not encodable as canonical JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Rebuild `value` with every object's keys in lexicographic order.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Canonical byte encoding of a JSON value.
///
/// Numbers use serde_json's rendering (integers stay integral, floats use the
/// shortest round-trip form); `null` is preserved. Consumers must re-sort
/// before hashing, so on-disk key order is free to differ.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>, CanonicalError> {
    Ok(serde_json::to_vec(&sort_keys(value))?)
}

/// Canonical encoding as a string, mostly for diagnostics.
pub fn canonical_json(value: &Value) -> Result<String, CanonicalError> {
    Ok(String::from_utf8_lossy(&canonical_bytes(value)?).into_owned())
}

/// SHA-256 over the canonical encoding of any serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = serde_json::to_value(value)?;
    Ok(sha256_hex(&canonical_bytes(&json)?))
}

/// Canonical bytes of any serializable value; the structural-equality probe
/// used by the orchestrator's legality check.
pub fn canonical_bytes_of<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonicalError> {
    let json = serde_json::to_value(value)?;
    canonical_bytes(&json)
}
