//! The validation/transform pipeline applied on create and update.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::case::transform_case;
use crate::error::{LeafDbError, Result};
use crate::schema::{Blueprint, FieldRule};

lazy_static! {
    static ref INNER_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Validate `payload` against `blueprint` and return the normalized document.
///
/// Per declared field: a supplied value is checked (kind membership, then
/// length/range/enum/custom predicate — the first violated constraint fails,
/// naming the field and rule) and normalized (trim, inner-trim, case, custom
/// transform, in that order). A missing required field fails; a missing field
/// with a default is filled in. Fields not declared in the blueprint are
/// dropped; `created_at`/`updated_at` are kept when `timestamps` is set.
pub fn validate_and_transform(
    blueprint: &Blueprint,
    timestamps: bool,
    payload: &Value,
) -> Result<Value> {
    let Some(supplied) = payload.as_object() else {
        return Err(LeafDbError::Validation(
            "document payload must be an object".into(),
        ));
    };

    let mut document = Map::new();

    for (name, rule) in blueprint {
        match supplied.get(name).filter(|v| !v.is_null()) {
            Some(value) => {
                validate_field(name, rule, value)?;
                let mut value = value.clone();
                // Nested object fields recurse against their own sub-blueprint.
                if let (Some(sub), true) = (&rule.fields, value.is_object()) {
                    value = validate_and_transform(sub, false, &value)?;
                }
                let value = transform_field(rule, value);
                document.insert(name.clone(), value);
            }
            None => {
                if rule.required {
                    return Err(LeafDbError::Validation(format!(
                        "field '{name}' is required"
                    )));
                }
                if let Some(default) = &rule.default {
                    document.insert(name.clone(), default.clone());
                }
            }
        }
    }

    if timestamps {
        for key in ["created_at", "updated_at"] {
            if let Some(stamp) = supplied.get(key) {
                document.insert(key.to_string(), stamp.clone());
            }
        }
    }

    Ok(Value::Object(document))
}

fn validate_field(name: &str, rule: &FieldRule, value: &Value) -> Result<()> {
    if !rule.kinds.is_empty() && !rule.kinds.iter().any(|kind| kind.matches(value)) {
        let expected = rule
            .kinds
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        return Err(LeafDbError::Validation(format!(
            "field '{name}' must be of type {expected}"
        )));
    }

    if let (Some(min), Some(s)) = (rule.min_length, value.as_str()) {
        if s.chars().count() < min {
            return Err(LeafDbError::Validation(format!(
                "field '{name}' must have at least {min} characters"
            )));
        }
    }
    if let (Some(max), Some(s)) = (rule.max_length, value.as_str()) {
        if s.chars().count() > max {
            return Err(LeafDbError::Validation(format!(
                "field '{name}' must have at most {max} characters"
            )));
        }
    }

    if let (Some(min), Some(n)) = (rule.min, value.as_f64()) {
        if n < min {
            return Err(LeafDbError::Validation(format!(
                "field '{name}' must be at least {min}"
            )));
        }
    }
    if let (Some(max), Some(n)) = (rule.max, value.as_f64()) {
        if n > max {
            return Err(LeafDbError::Validation(format!(
                "field '{name}' must be at most {max}"
            )));
        }
    }

    if let Some(allowed) = &rule.enum_values {
        if !allowed.contains(value) {
            let listed = allowed
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(LeafDbError::Validation(format!(
                "field '{name}' must be one of {listed}"
            )));
        }
    }

    if let Some(predicate) = &rule.validate {
        if !predicate(value) {
            return Err(LeafDbError::Validation(format!(
                "field '{name}' does not satisfy its custom validation rule"
            )));
        }
    }

    Ok(())
}

fn transform_field(rule: &FieldRule, mut value: Value) -> Value {
    if rule.trim {
        if let Some(s) = value.as_str() {
            value = Value::String(s.trim().to_string());
        }
    }
    if rule.inner_trim {
        if let Some(s) = value.as_str() {
            value = Value::String(INNER_WHITESPACE.replace_all(s, " ").trim().to_string());
        }
    }
    if let (Some(format), Some(s)) = (rule.to_case, value.as_str()) {
        value = Value::String(transform_case(s, format));
    }
    if let Some(transform) = &rule.transform {
        value = transform(value);
    }

    value
}
