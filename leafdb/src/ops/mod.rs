//! Value operations on a resolved cursor: read-modify-write helpers over the
//! addressed sequence, number, object or string.
//!
//! Each operation is serialized through the store's queue at its own entry
//! and persists through the same whole-file write path as `set`. Type
//! mismatches are usage errors raised before anything touches disk.

mod arrays;
mod numbers;
mod objects;
mod strings;

use serde_json::Value;

use crate::cursor::Cursor;
use crate::error::{LeafDbError, Result};

impl Cursor {
    fn require_array(&self, verb: &str) -> Result<Vec<Value>> {
        match self.json() {
            Some(Value::Array(items)) => Ok(items.clone()),
            _ => Err(LeafDbError::Usage(format!(
                "{verb} only works on sequences"
            ))),
        }
    }

    fn require_object(&self, verb: &str) -> Result<serde_json::Map<String, Value>> {
        match self.json() {
            Some(Value::Object(map)) => Ok(map.clone()),
            _ => Err(LeafDbError::Usage(format!(
                "{verb} only works on keyed containers"
            ))),
        }
    }

    fn require_number(&self, verb: &str) -> Result<f64> {
        match self.json().and_then(Value::as_f64) {
            Some(number) => Ok(number),
            None => Err(LeafDbError::Usage(format!("{verb} only works on numbers"))),
        }
    }

    fn require_string(&self, verb: &str) -> Result<String> {
        match self.json().and_then(Value::as_str) {
            Some(s) => Ok(s.to_string()),
            None => Err(LeafDbError::Usage(format!("{verb} only works on strings"))),
        }
    }
}

/// Keep integral results integral; JSON has no separate float type for whole
/// numbers but `6` reads better than `6.0` in a document.
fn number_value(result: f64) -> Result<Value> {
    if result.fract() == 0.0 && result.abs() < i64::MAX as f64 {
        return Ok(Value::from(result as i64));
    }
    serde_json::Number::from_f64(result)
        .map(Value::Number)
        .ok_or_else(|| LeafDbError::Usage("arithmetic produced a non-finite number".into()))
}
