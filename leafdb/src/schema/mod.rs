//! Blueprints: per-field rules driving validation, transformation and
//! document formatting.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::case::CaseFormat;

/// Accepted value kind for a blueprint field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Bool,
    Array,
    Object,
}

impl FieldKind {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Bool => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Custom validation predicate.
pub type ValidateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
/// Custom normalization step.
pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A field-rule map: field name to rule, in declaration order.
pub type Blueprint = BTreeMap<String, FieldRule>;

/// Declares what a document field accepts and how it is normalized.
/// Built fluently:
///
/// ```
/// use leafdb::{FieldKind, FieldRule};
///
/// let rule = FieldRule::new(FieldKind::String).required().trim().min_length(2);
/// ```
#[derive(Clone, Default)]
pub struct FieldRule {
    pub(crate) kinds: Vec<FieldKind>,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) enum_values: Option<Vec<Value>>,
    pub(crate) validate: Option<ValidateFn>,
    pub(crate) trim: bool,
    pub(crate) inner_trim: bool,
    pub(crate) to_case: Option<CaseFormat>,
    pub(crate) transform: Option<TransformFn>,
    pub(crate) omit: bool,
    pub(crate) immutable: bool,
    pub(crate) populate: bool,
    pub(crate) fields: Option<Blueprint>,
}

impl FieldRule {
    pub fn new(kind: FieldKind) -> Self {
        FieldRule {
            kinds: vec![kind],
            ..FieldRule::default()
        }
    }

    /// Accept an additional kind (a field may declare several).
    pub fn or_kind(mut self, kind: FieldKind) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Restrict the field to a closed set of literals.
    pub fn one_of(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    pub fn validate(mut self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.validate = Some(Arc::new(predicate));
        self
    }

    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Collapse runs of inner whitespace to single spaces.
    pub fn inner_trim(mut self) -> Self {
        self.inner_trim = true;
        self
    }

    pub fn to_case(mut self, format: CaseFormat) -> Self {
        self.to_case = Some(format);
        self
    }

    pub fn transform(mut self, transform: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Strip this field from read results.
    pub fn omit(mut self) -> Self {
        self.omit = true;
        self
    }

    /// Reject updates touching this field.
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Treat the field's value as a reference (or list of references) to
    /// resolve on read.
    pub fn populate(mut self) -> Self {
        self.populate = true;
        self
    }

    /// Nested rules for an object-shaped field.
    pub fn fields(mut self, blueprint: Blueprint) -> Self {
        self.fields = Some(blueprint);
        self
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("kinds", &self.kinds)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("omit", &self.omit)
            .field("immutable", &self.immutable)
            .field("populate", &self.populate)
            .finish_non_exhaustive()
    }
}

/// Collection-level options recognized by the schema layer.
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    /// Stamp `created_at`/`updated_at` (epoch milliseconds).
    pub timestamps: bool,
    /// Merge the identifier into results as `_id` instead of returning an
    /// `[id, document]` pair.
    pub inline_id: bool,
    /// Length of generated identifiers (prefix included). Default 20.
    pub id_length: Option<usize>,
    /// Prefix applied to document names, supplied or generated.
    pub name_prefix: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_matching() {
        assert!(FieldKind::String.matches(&json!("x")));
        assert!(FieldKind::Number.matches(&json!(1.5)));
        assert!(FieldKind::Bool.matches(&json!(true)));
        assert!(FieldKind::Array.matches(&json!([])));
        assert!(FieldKind::Object.matches(&json!({})));
        assert!(!FieldKind::String.matches(&json!(1)));
        assert!(!FieldKind::Array.matches(&json!({})));
    }

    #[test]
    fn test_builder_chain() {
        let rule = FieldRule::new(FieldKind::String)
            .or_kind(FieldKind::Number)
            .required()
            .min_length(2)
            .one_of([json!("a"), json!("b")])
            .trim()
            .omit();

        assert_eq!(rule.kinds, vec![FieldKind::String, FieldKind::Number]);
        assert!(rule.required);
        assert_eq!(rule.min_length, Some(2));
        assert_eq!(rule.enum_values.as_ref().unwrap().len(), 2);
        assert!(rule.trim);
        assert!(rule.omit);
        assert!(!rule.immutable);
    }
}
