//! Field definitions and their constraint kinds.
//!
//! A field is described by a `FieldSpec`: key, display name, flags, and a
//! kind-specific `FieldConstraints` payload. Constraints are plain data, so a
//! list of `FieldDefinition`s serializes as-is and can be stored alongside the
//! records it describes.

use std::fmt;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;
use crate::value::{AttributeValue, parse_time};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Key, name, and flags shared by every field kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldDescriptor {
    pub key: String,
    pub name: String,
    pub editable: bool,
    pub required: bool,
}

/// Kind of a field, independent of its constraint values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Numeric,
    Text,
    Bool,
    Time,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Time => "time",
        }
    }

    /// Interpret a wire scalar for a field of this kind.
    ///
    /// Text keeps JSON strings verbatim and Time accepts layout strings and
    /// epoch seconds. Everything else goes through inference decode, so a
    /// value the kind cannot interpret still materializes and is rejected
    /// later by validation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Value` for `null` and non-scalar input.
    pub fn coerce(self, wire: &Value) -> Result<AttributeValue, CoreError> {
        match (self, wire) {
            (Self::Text, Value::String(s)) => Ok(AttributeValue::String(s.clone())),
            (Self::Time, Value::String(s)) => {
                Ok(parse_time(s).map_or_else(|_| AttributeValue::infer(s), AttributeValue::Time))
            }
            (Self::Time, Value::Number(_)) => {
                AttributeValue::time(wire.clone()).or_else(|_| AttributeValue::decode(wire))
            }
            _ => AttributeValue::decode(wire),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Kind-specific constraint payload. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldConstraints {
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Text {
        #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        regex: Option<String>,
    },
    Bool,
    Time,
}

impl FieldConstraints {
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::Numeric { .. } => FieldType::Numeric,
            Self::Text { .. } => FieldType::Text,
            Self::Bool => FieldType::Bool,
            Self::Time => FieldType::Time,
        }
    }

    #[must_use]
    pub fn regex(&self) -> Option<&str> {
        match self {
            Self::Text { regex, .. } => regex.as_deref(),
            _ => None,
        }
    }

    /// Check one value. `pattern` is the compiled form of the Text regex.
    /// Returns the failure reason.
    pub(crate) fn check(
        &self,
        value: &AttributeValue,
        pattern: Option<&Regex>,
    ) -> Result<(), String> {
        match self {
            Self::Numeric { min, max } => {
                let Some(actual) = value.try_f64() else {
                    return Err(format!("expected number, got {}", value.kind()));
                };
                if let Some(max) = max.filter(|max| actual > *max) {
                    return Err(format!("exceeds max={max}"));
                }
                if let Some(min) = min.filter(|min| actual < *min) {
                    return Err(format!("below min={min}"));
                }
                Ok(())
            }
            Self::Text {
                min_length,
                max_length,
                ..
            } => {
                let Some(text) = value.try_str() else {
                    return Err(format!("expected string, got {}", value.kind()));
                };
                let len = text.chars().count();
                if let Some(min) = min_length.filter(|min| len < *min) {
                    return Err(format!("shorter than minLength={min}"));
                }
                if let Some(max) = max_length.filter(|max| len > *max) {
                    return Err(format!("longer than maxLength={max}"));
                }
                if let Some(re) = pattern.filter(|re| !re.is_match(text)) {
                    return Err(format!("does not match regex={}", re.as_str()));
                }
                Ok(())
            }
            Self::Bool if value.try_bool().is_none() => {
                Err(format!("expected bool, got {}", value.kind()))
            }
            Self::Time if value.try_time().is_none() => {
                Err(format!("expected time, got {}", value.kind()))
            }
            Self::Bool | Self::Time => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSpec
// ---------------------------------------------------------------------------

/// Polymorphic description of one field. New field kinds implement this.
pub trait FieldSpec {
    fn describe(&self) -> FieldDescriptor;

    fn constraints(&self) -> FieldConstraints;

    fn field_type(&self) -> FieldType {
        self.constraints().field_type()
    }
}

/// Serializable definition of one field of a `RecordSchema`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDefinition {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub required: bool,
    pub constraints: FieldConstraints,
}

impl FieldDefinition {
    #[must_use]
    pub fn from_spec(spec: &dyn FieldSpec) -> Self {
        let FieldDescriptor {
            key,
            name,
            editable,
            required,
        } = spec.describe();
        Self {
            key,
            name,
            editable,
            required,
            constraints: spec.constraints(),
        }
    }

    #[must_use]
    pub fn bool(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_constraints(key, name, FieldConstraints::Bool)
    }

    #[must_use]
    pub fn time(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_constraints(key, name, FieldConstraints::Time)
    }

    #[must_use]
    pub fn with_constraints(
        key: impl Into<String>,
        name: impl Into<String>,
        constraints: FieldConstraints,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            editable: false,
            required: false,
            constraints,
        }
    }

    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub const fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }
}

impl FieldSpec for FieldDefinition {
    fn describe(&self) -> FieldDescriptor {
        FieldDescriptor {
            key: self.key.clone(),
            name: self.name.clone(),
            editable: self.editable,
            required: self.required,
        }
    }

    fn constraints(&self) -> FieldConstraints {
        self.constraints.clone()
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Numeric field with optional inclusive bounds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericField {
    descriptor: FieldDescriptor,
    min: Option<f64>,
    max: Option<f64>,
}

impl NumericField {
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            descriptor: FieldDescriptor {
                key: key.into(),
                name: name.into(),
                ..FieldDescriptor::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub const fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.descriptor.required = required;
        self
    }

    #[must_use]
    pub const fn editable(mut self, editable: bool) -> Self {
        self.descriptor.editable = editable;
        self
    }
}

impl FieldSpec for NumericField {
    fn describe(&self) -> FieldDescriptor {
        self.descriptor.clone()
    }

    fn constraints(&self) -> FieldConstraints {
        FieldConstraints::Numeric {
            min: self.min,
            max: self.max,
        }
    }
}

/// Text field with optional length bounds and pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextField {
    descriptor: FieldDescriptor,
    min_length: Option<usize>,
    max_length: Option<usize>,
    regex: Option<String>,
}

impl TextField {
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            descriptor: FieldDescriptor {
                key: key.into(),
                name: name.into(),
                ..FieldDescriptor::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    #[must_use]
    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.descriptor.required = required;
        self
    }

    #[must_use]
    pub const fn editable(mut self, editable: bool) -> Self {
        self.descriptor.editable = editable;
        self
    }
}

impl FieldSpec for TextField {
    fn describe(&self) -> FieldDescriptor {
        self.descriptor.clone()
    }

    fn constraints(&self) -> FieldConstraints {
        FieldConstraints::Text {
            min_length: self.min_length,
            max_length: self.max_length,
            regex: self.regex.clone(),
        }
    }
}

impl From<NumericField> for FieldDefinition {
    fn from(field: NumericField) -> Self {
        Self::from_spec(&field)
    }
}

impl From<TextField> for FieldDefinition {
    fn from(field: TextField) -> Self {
        Self::from_spec(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn numeric(min: Option<f64>, max: Option<f64>) -> FieldConstraints {
        FieldConstraints::Numeric { min, max }
    }

    #[test]
    fn builder_produces_definition() {
        let def: FieldDefinition = NumericField::new("age", "Age")
            .min(1.0)
            .max(100.0)
            .required(true)
            .into();
        assert_eq!(def.key, "age");
        assert!(def.required);
        assert!(!def.editable);
        assert_eq!(def.field_type(), FieldType::Numeric);
        assert_eq!(def.constraints, numeric(Some(1.0), Some(100.0)));
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        let c = numeric(Some(1.0), Some(100.0));
        assert!(c.check(&AttributeValue::from(1), None).is_ok());
        assert!(c.check(&AttributeValue::from(100), None).is_ok());
        assert_eq!(
            c.check(&AttributeValue::from(200), None),
            Err("exceeds max=100".to_string())
        );
        assert_eq!(
            c.check(&AttributeValue::from(0), None),
            Err("below min=1".to_string())
        );
    }

    #[test]
    fn min_is_enforced_without_max() {
        let c = numeric(Some(5.0), None);
        assert_eq!(
            c.check(&AttributeValue::from(3), None),
            Err("below min=5".to_string())
        );
        assert!(c.check(&AttributeValue::from(i64::MAX), None).is_ok());
    }

    #[test]
    fn numeric_rejects_other_kinds() {
        let c = numeric(None, None);
        assert_eq!(
            c.check(&AttributeValue::from("ten"), None),
            Err("expected number, got string".to_string())
        );
    }

    #[test]
    fn text_length_counts_chars() {
        let c = FieldConstraints::Text {
            min_length: Some(1),
            max_length: Some(3),
            regex: None,
        };
        assert!(c.check(&AttributeValue::from("äöü"), None).is_ok());
        assert_eq!(
            c.check(&AttributeValue::from("abcd"), None),
            Err("longer than maxLength=3".to_string())
        );
        assert_eq!(
            c.check(&AttributeValue::from(""), None),
            Err("shorter than minLength=1".to_string())
        );
    }

    #[test]
    fn text_regex_must_match() {
        let c = FieldConstraints::Text {
            min_length: None,
            max_length: None,
            regex: Some("^[a-z]+$".into()),
        };
        let re = Regex::new("^[a-z]+$").unwrap();
        assert!(c.check(&AttributeValue::from("switch"), Some(&re)).is_ok());
        assert_eq!(
            c.check(&AttributeValue::from("Switch01"), Some(&re)),
            Err("does not match regex=^[a-z]+$".to_string())
        );
    }

    #[test]
    fn bool_and_time_check_kind_only() {
        assert!(FieldConstraints::Bool
            .check(&AttributeValue::from(false), None)
            .is_ok());
        assert!(FieldConstraints::Time
            .check(&AttributeValue::from("2024"), None)
            .is_err());
    }

    #[test]
    fn coerce_by_kind() {
        assert_eq!(
            FieldType::Text.coerce(&json!("10")).unwrap(),
            AttributeValue::String("10".into())
        );
        assert_eq!(FieldType::Numeric.coerce(&json!("10")).unwrap().as_i64(), 10);
        assert_eq!(
            FieldType::Bool.coerce(&json!("true")).unwrap(),
            AttributeValue::Bool(true)
        );
        assert_eq!(
            FieldType::Time.coerce(&json!(0)).unwrap().encode(),
            json!("1970-01-01 00:00:00")
        );
        assert!(FieldType::Numeric.coerce(&Value::Null).is_err());
    }

    #[test]
    fn out_of_range_epoch_is_kept_for_validation() {
        let decoded = FieldType::Time.coerce(&json!(1e20)).unwrap();
        assert_eq!(decoded.kind(), crate::value::ValueKind::Number);
        assert_eq!(
            FieldConstraints::Time.check(&decoded, None),
            Err("expected time, got number".to_string())
        );
        assert_eq!(
            FieldType::Time.coerce(&json!(0)).unwrap().kind(),
            crate::value::ValueKind::Time
        );
    }

    #[test]
    fn constraints_serialize_tagged() {
        let c = FieldConstraints::Text {
            min_length: Some(1),
            max_length: Some(20),
            regex: None,
        };
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({"kind": "text", "minLength": 1, "maxLength": 20})
        );
        let back: FieldConstraints =
            serde_json::from_value(json!({"kind": "numeric", "max": 5})).unwrap();
        assert_eq!(back, numeric(None, Some(5.0)));
    }
}
