//! Compiled record layouts.
//!
//! A `RecordSchema` is an ordered, immutable list of `FieldDefinition`s. It
//! decodes JSON payloads into `Record`s and validates them with a plain loop
//! over its fields. Changing the field list always produces a new schema, so
//! a published schema can be shared across threads without locking.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;
use crate::field::{FieldDefinition, FieldSpec};
use crate::record::Record;
use crate::value::AttributeValue;

#[derive(Debug)]
struct Layout {
    fields: Vec<FieldDefinition>,
    /// Compiled Text patterns, parallel to `fields`.
    patterns: Vec<Option<Regex>>,
    /// Key → position, built on first lookup.
    index: OnceLock<HashMap<String, usize>>,
}

/// Reusable, validated description of a record's legal shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldDefinition>", into = "Vec<FieldDefinition>")]
pub struct RecordSchema {
    layout: Arc<Layout>,
}

impl RecordSchema {
    /// Compile a list of field definitions.
    ///
    /// # Errors
    ///
    /// - `CoreError::Value` if a key is empty
    /// - `CoreError::DuplicateKey` if two fields share a key
    /// - `CoreError::Parse` if a Text regex does not compile
    pub fn compile<I>(fields: I) -> Result<Self, CoreError>
    where
        I: IntoIterator,
        I::Item: Into<FieldDefinition>,
    {
        let fields: Vec<FieldDefinition> = fields.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(fields.len());
        let mut patterns = Vec::with_capacity(fields.len());

        for field in &fields {
            if field.key.is_empty() {
                return Err(CoreError::Value("field key must not be empty".into()));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(CoreError::DuplicateKey(field.key.clone()));
            }
            let pattern = field
                .constraints
                .regex()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        CoreError::Parse(format!("invalid regex for field '{}': {e}", field.key))
                    })
                })
                .transpose()?;
            patterns.push(pattern);
        }

        Ok(Self {
            layout: Arc::new(Layout {
                fields,
                patterns,
                index: OnceLock::new(),
            }),
        })
    }

    /// Compile a schema that is known to be valid, e.g. a built-in layout held
    /// in a `LazyLock`.
    ///
    /// # Panics
    ///
    /// Panics if [`RecordSchema::compile`] would return an error.
    #[must_use]
    #[track_caller]
    pub fn must_compile<I>(fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FieldDefinition>,
    {
        match Self::compile(fields) {
            Ok(schema) => schema,
            Err(e) => panic!("static schema compilation failed: {e}"),
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.layout.fields
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.index()
            .get(key)
            .map(|&position| &self.layout.fields[position])
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layout.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layout.fields.is_empty()
    }

    /// New schema with `field` appended. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`RecordSchema::compile`].
    pub fn with_field(&self, field: impl Into<FieldDefinition>) -> Result<Self, CoreError> {
        self.with_fields([field.into()])
    }

    /// New schema with `extra` appended in order.
    ///
    /// # Errors
    ///
    /// Same as [`RecordSchema::compile`].
    pub fn with_fields<I>(&self, extra: I) -> Result<Self, CoreError>
    where
        I: IntoIterator,
        I::Item: Into<FieldDefinition>,
    {
        Self::compile(
            self.layout
                .fields
                .iter()
                .cloned()
                .chain(extra.into_iter().map(Into::into)),
        )
    }

    fn index(&self) -> &HashMap<String, usize> {
        self.layout.index.get_or_init(|| {
            self.layout
                .fields
                .iter()
                .enumerate()
                .map(|(position, field)| (field.key.clone(), position))
                .collect()
        })
    }

    // -----------------------------------------------------------------------
    // Record codec
    // -----------------------------------------------------------------------

    /// Decode a JSON object payload.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Parse` if the bytes are not JSON, are not an
    /// object, or hold a non-scalar value for a schema field.
    pub fn decode(&self, payload: &[u8]) -> Result<Record, CoreError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| CoreError::Parse(format!("malformed record payload: {e}")))?;
        self.decode_value(&value)
    }

    /// Decode an already-parsed payload.
    ///
    /// Payload keys the schema does not declare are dropped. Schema keys that
    /// are missing or `null` in the payload stay unset.
    ///
    /// # Errors
    ///
    /// See [`RecordSchema::decode`].
    pub fn decode_value(&self, payload: &Value) -> Result<Record, CoreError> {
        let Value::Object(map) = payload else {
            return Err(CoreError::Parse(format!(
                "record payload must be a JSON object, got {payload}"
            )));
        };

        let mut record = Record::new();
        for field in &self.layout.fields {
            match map.get(&field.key) {
                None | Some(Value::Null) => {}
                Some(wire @ (Value::Array(_) | Value::Object(_))) => {
                    return Err(CoreError::Parse(format!(
                        "field '{}' must hold a scalar, got {wire}",
                        field.key
                    )));
                }
                Some(wire) => {
                    record.insert(field.key.clone(), field.field_type().coerce(wire)?);
                }
            }
        }
        Ok(record)
    }

    /// Encode `record` as a JSON object of exactly the fields it holds.
    #[must_use]
    pub fn encode(&self, record: &Record) -> Vec<u8> {
        record.encode()
    }

    /// Look up a value set on `record`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the record does not hold `key`.
    pub fn get<'r>(&self, record: &'r Record, key: &str) -> Result<&'r AttributeValue, CoreError> {
        record.get(key)
    }

    /// Check every schema field against `record`, in schema order.
    ///
    /// Absent optional fields are skipped. An absent required field fails
    /// with reason `is required`.
    ///
    /// # Errors
    ///
    /// Returns the first `CoreError::Validation` found.
    pub fn validate(&self, record: &Record) -> Result<(), CoreError> {
        for (field, pattern) in self.layout.fields.iter().zip(&self.layout.patterns) {
            match record.value(&field.key) {
                None if field.required => {
                    return Err(CoreError::Validation {
                        key: field.key.clone(),
                        constraint: "is required".into(),
                        actual: "<unset>".into(),
                    });
                }
                None => {}
                Some(value) => field
                    .constraints
                    .check(value, pattern.as_ref())
                    .map_err(|constraint| CoreError::Validation {
                        key: field.key.clone(),
                        constraint,
                        actual: value.to_string(),
                    })?,
            }
        }
        Ok(())
    }
}

impl PartialEq for RecordSchema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.layout, &other.layout) || self.layout.fields == other.layout.fields
    }
}

impl TryFrom<Vec<FieldDefinition>> for RecordSchema {
    type Error = CoreError;

    fn try_from(fields: Vec<FieldDefinition>) -> Result<Self, Self::Error> {
        Self::compile(fields)
    }
}

impl From<RecordSchema> for Vec<FieldDefinition> {
    fn from(schema: RecordSchema) -> Self {
        schema.layout.fields.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldConstraints, NumericField, TextField};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn host_schema() -> RecordSchema {
        RecordSchema::compile([
            FieldDefinition::from(TextField::new("hostname", "Host name").required(true)),
            FieldDefinition::from(NumericField::new("cpu", "CPU cores").min(1.0)),
            FieldDefinition::bool("virtual", "Virtual"),
            FieldDefinition::time("last_seen", "Last seen"),
        ])
        .unwrap()
    }

    #[test]
    fn schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecordSchema>();
    }

    #[test]
    fn duplicate_key_fails() {
        let err = RecordSchema::compile([
            FieldDefinition::bool("flag", "Flag"),
            FieldDefinition::time("flag", "Flag again"),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey(key) if key == "flag"));
    }

    #[test]
    fn empty_key_fails() {
        let err = RecordSchema::compile([FieldDefinition::bool("", "Nameless")]).unwrap_err();
        assert!(matches!(err, CoreError::Value(_)));
    }

    #[test]
    fn bad_regex_fails_at_compile_time() {
        let err = RecordSchema::compile([TextField::new("ip", "IP").regex("([0-9")]).unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
    }

    #[test]
    fn with_field_returns_new_schema() {
        let base = host_schema();
        let extended = base
            .with_field(FieldDefinition::bool("managed", "Managed"))
            .unwrap();
        assert_eq!(base.len(), 4);
        assert_eq!(extended.len(), 5);
        assert!(extended.contains("managed"));
        assert!(!base.contains("managed"));
        assert!(base.with_field(FieldDefinition::bool("cpu", "dup")).is_err());
    }

    #[test]
    fn field_lookup_by_key() {
        let schema = host_schema();
        let cpu = schema.field("cpu").unwrap();
        assert_eq!(
            cpu.constraints,
            FieldConstraints::Numeric {
                min: Some(1.0),
                max: None
            }
        );
        assert!(schema.field("memory").is_none());
        assert_eq!(schema.fields()[0].key, "hostname");
    }

    #[test]
    fn decode_leaves_null_and_missing_unset() {
        let schema = host_schema();
        let record = schema
            .decode(br#"{"hostname": "db-01", "cpu": null}"#)
            .unwrap();
        assert_eq!(record.len(), 1);
        assert!(!record.contains_key("cpu"));
        assert!(!record.contains_key("virtual"));
    }

    #[test]
    fn decode_coerces_by_field_kind() {
        let schema = host_schema();
        let record = schema
            .decode_value(&json!({
                "hostname": "12345",
                "cpu": "8",
                "virtual": "false",
                "last_seen": 86_400
            }))
            .unwrap();
        assert_eq!(record.get("hostname").unwrap(), &AttributeValue::from("12345"));
        assert_eq!(record.get("cpu").unwrap().as_i64(), 8);
        assert_eq!(record.get("virtual").unwrap(), &AttributeValue::Bool(false));
        assert_eq!(
            record.get("last_seen").unwrap().to_string(),
            "1970-01-02 00:00:00"
        );
        schema.validate(&record).unwrap();
    }

    #[test]
    fn decode_rejects_non_objects_and_nested_values() {
        let schema = host_schema();
        assert!(matches!(schema.decode(b"[1, 2]"), Err(CoreError::Parse(_))));
        assert!(matches!(schema.decode(b"{not json"), Err(CoreError::Parse(_))));
        assert!(matches!(
            schema.decode(br#"{"hostname": ["a", "b"]}"#),
            Err(CoreError::Parse(_))
        ));
    }

    #[test]
    fn validate_reports_missing_required_field() {
        let schema = host_schema();
        let record = Record::new().with("cpu", 4);
        let err = schema.validate(&record).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed for field 'hostname': is required (actual: <unset>)"
        );
    }

    #[test]
    fn validate_stops_at_first_failure_in_schema_order() {
        let schema = host_schema();
        let record = Record::new()
            .with("hostname", "web-01")
            .with("cpu", 0)
            .with("virtual", "yes");
        let err = schema.validate(&record).unwrap_err();
        assert_eq!(err.field_key(), Some("cpu"));
    }

    #[test]
    fn validate_rejects_kind_mismatch() {
        let schema = host_schema();
        let record = schema
            .decode_value(&json!({"hostname": "web-01", "virtual": "yes"}))
            .unwrap();
        let err = schema.validate(&record).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation { ref key, ref constraint, .. }
                if key == "virtual" && constraint == "expected bool, got string"
        ));
    }

    #[test]
    fn schema_serializes_as_field_list() {
        let schema = host_schema();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(4));
        let back: RecordSchema = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);

        let dup = json!([
            {"key": "a", "constraints": {"kind": "bool"}},
            {"key": "a", "constraints": {"kind": "time"}}
        ]);
        assert!(serde_json::from_value::<RecordSchema>(dup).is_err());
    }
}
