//! JSON text codec for [`Value`].
//!
//! The string-keyed backing medium behind the caches stores plain strings,
//! so cache entries travel through JSON text. Conversion *to* JSON is
//! fallible: a value whose node graph contains a reference cycle has no
//! finite JSON form, and non-finite floats have no JSON number. Conversion
//! *from* JSON is total.
//!
//! Shared (non-cyclic) nodes are legal input and are duplicated in the JSON
//! output; node identity is a property of the in-memory graph, not of the
//! text form.
//!
//! # Timestamp encoding
//!
//! [`Value::Timestamp`] encodes as the tagged object `{"$ts": millis}` so the
//! temporal type survives a round trip through the medium. A JSON object
//! whose only key is `$ts` with an integer value decodes back to a
//! timestamp.

use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use crate::types::Value;

/// Tag key used for the JSON encoding of [`Value::Timestamp`].
const TIMESTAMP_TAG: &str = "$ts";

/// Failure to convert a [`Value`] to or from JSON text.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value's node graph contains a reference cycle.
    #[error("value contains a reference cycle and has no JSON form")]
    CyclicValue,

    /// A float payload is NaN or infinite.
    #[error("float value {0} has no JSON representation")]
    NonFiniteFloat(f64),

    /// The input text is not valid JSON.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Converts a value into a `serde_json::Value`.
///
/// # Errors
///
/// Returns [`CodecError::CyclicValue`] if the value graph is cyclic and
/// [`CodecError::NonFiniteFloat`] for NaN or infinite floats.
pub fn to_json(value: &Value) -> Result<serde_json::Value, CodecError> {
    let mut in_progress = Vec::new();
    to_json_inner(value, &mut in_progress)
}

fn to_json_inner(
    value: &Value,
    in_progress: &mut Vec<usize>,
) -> Result<serde_json::Value, CodecError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Int(n) => Ok(serde_json::Value::from(*n)),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .ok_or(CodecError::NonFiniteFloat(*x)),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Timestamp(millis) => {
            let mut tagged = serde_json::Map::with_capacity(1);
            tagged.insert(TIMESTAMP_TAG.to_string(), serde_json::Value::from(*millis));
            Ok(serde_json::Value::Object(tagged))
        }
        Value::Array(node) => {
            let ptr = Rc::as_ptr(node) as usize;
            if in_progress.contains(&ptr) {
                return Err(CodecError::CyclicValue);
            }
            in_progress.push(ptr);
            let mut items = Vec::with_capacity(node.borrow().len());
            for item in node.borrow().iter() {
                items.push(to_json_inner(item, in_progress)?);
            }
            in_progress.pop();
            Ok(serde_json::Value::Array(items))
        }
        Value::Map(node) => {
            let ptr = Rc::as_ptr(node) as usize;
            if in_progress.contains(&ptr) {
                return Err(CodecError::CyclicValue);
            }
            in_progress.push(ptr);
            let mut entries = serde_json::Map::with_capacity(node.borrow().len());
            for (key, item) in node.borrow().iter() {
                entries.insert(key.clone(), to_json_inner(item, in_progress)?);
            }
            in_progress.pop();
            Ok(serde_json::Value::Object(entries))
        }
    }
}

/// Converts a `serde_json::Value` into a [`Value`].
///
/// Numbers become [`Value::Int`] when exactly representable as `i64` and
/// [`Value::Float`] otherwise. Tagged `{"$ts": millis}` objects become
/// [`Value::Timestamp`].
#[must_use]
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map_or_else(|| Value::Float(n.as_f64().unwrap_or(f64::NAN)), Value::Int),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json)),
        serde_json::Value::Object(entries) => {
            if entries.len() == 1 {
                if let Some(millis) = entries.get(TIMESTAMP_TAG).and_then(serde_json::Value::as_i64)
                {
                    return Value::Timestamp(millis);
                }
            }
            Value::map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), from_json(v)))
                    .collect::<BTreeMap<_, _>>(),
            )
        }
    }
}

/// Serializes a value to JSON text.
///
/// # Errors
///
/// Same failure modes as [`to_json`].
pub fn to_json_string(value: &Value) -> Result<String, CodecError> {
    let json = to_json(value)?;
    Ok(json.to_string())
}

/// Parses JSON text into a value.
///
/// # Errors
///
/// Returns [`CodecError::Json`] when the text is not valid JSON.
pub fn from_json_string(text: &str) -> Result<Value, CodecError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Ok(from_json(&json))
}
