//! Deep merge of JSON records with type-directed conflict resolution.
//!
//! `merge(base, top)` produces a new record containing every key of both
//! operands. When a key exists on both sides, the rule depends on the
//! type of `top`'s value:
//!
//! - scalar (string, number, bool): `top` replaces `base`;
//! - array: appended to `base`'s array if `base` holds an array at that
//!   key, otherwise replaces the slot wholesale;
//! - record: merged recursively into `base`'s record at that key,
//!   otherwise replaces the slot wholesale;
//! - `null`: added only when the key is absent from `base`; a `null`
//!   never overwrites an existing value.
//!
//! Neither operand is mutated. Result field order is `base`'s key order
//! for carried and merged keys, with `top`-only keys appended in `top`
//! order, so output stays stable across runs.

use serde_json::{Map, Value};

/// Errors raised by [`merge`].
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A merge operand was not a record (JSON object).
    #[error("cannot merge non-record values: base is {base_kind}, top is {top_kind}")]
    InvalidInput {
        base_kind: &'static str,
        top_kind: &'static str,
    },
}

/// Human-readable JSON type name, used in error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "record",
    }
}

/// Merge record `top` onto record `base`, returning a new record.
///
/// Both operands must be JSON objects; anything else is a fatal
/// [`MergeError::InvalidInput`].
pub fn merge(base: &Value, top: &Value) -> Result<Value, MergeError> {
    match (base.as_object(), top.as_object()) {
        (Some(base_map), Some(top_map)) => Ok(Value::Object(merge_maps(base_map, top_map))),
        _ => Err(MergeError::InvalidInput {
            base_kind: value_kind(base),
            top_kind: value_kind(top),
        }),
    }
}

fn merge_maps(base: &Map<String, Value>, top: &Map<String, Value>) -> Map<String, Value> {
    let mut result = base.clone();

    for (key, value) in top {
        match value {
            Value::Null => {
                // An incoming null never clobbers an existing value.
                if !base.contains_key(key) {
                    result.insert(key.clone(), Value::Null);
                }
            }
            Value::Array(items) => {
                let combined = match base.get(key) {
                    Some(Value::Array(existing)) => {
                        let mut joined = existing.clone();
                        joined.extend(items.iter().cloned());
                        Value::Array(joined)
                    }
                    _ => Value::Array(items.clone()),
                };
                result.insert(key.clone(), combined);
            }
            Value::Object(record) => {
                let combined = match base.get(key) {
                    Some(Value::Object(existing)) => Value::Object(merge_maps(existing, record)),
                    _ => Value::Object(record.clone()),
                };
                result.insert(key.clone(), combined);
            }
            scalar => {
                result.insert(key.clone(), scalar.clone());
            }
        }
    }

    result
}

// ===========================================================================
// Tests
// ===========================================================================
