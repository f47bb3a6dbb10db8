//! Import/export tokens: a snapshot as base64-wrapped JSON.
//!
//! The token is what the UI shows in its share field. Decoding is strict and
//! returns an error; the store-level import built on top of it fails softly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::params::ParameterSnapshot;

/// Serialize a snapshot to its JSON text.
pub fn to_json(snapshot: &ParameterSnapshot) -> String {
    // A struct of plain f64 fields always serializes.
    serde_json::to_string(snapshot).unwrap_or_default()
}

/// Encode a snapshot as a printable token.
pub fn encode(snapshot: &ParameterSnapshot) -> String {
    STANDARD.encode(to_json(snapshot))
}

/// Decode a token into the raw JSON object it carries.
///
/// Callers that merge partial state (imports) work on this map directly.
pub fn decode_entries(token: &str) -> Result<Map<String, Value>, DecodeError> {
    let bytes = STANDARD.decode(token.trim())?;
    let text = String::from_utf8(bytes)?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError::NotAnObject),
    }
}

/// Decode a token into a full snapshot; missing ids take their defaults.
pub fn decode(token: &str) -> Result<ParameterSnapshot, DecodeError> {
    let entries = decode_entries(token)?;
    Ok(serde_json::from_value(Value::Object(entries))?)
}
