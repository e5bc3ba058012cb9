//! Decode and validate payloads against a compiled `RecordSchema`.

use cmdb_core::field::{NumericField, TextField};
use cmdb_core::{AttributeValue, CoreError, FieldDefinition, RecordSchema};
use pretty_assertions::assert_eq;

fn person_schema() -> RecordSchema {
    RecordSchema::compile([
        FieldDefinition::from(NumericField::new("age", "Age").min(1.0).max(100.0)),
        FieldDefinition::from(TextField::new("name", "Name").min_length(1).max_length(20)),
    ])
    .unwrap()
}

#[test]
fn valid_payload_decodes_and_drops_unknown_keys() {
    let schema = person_schema();
    let record = schema
        .decode(br#"{"age": 10, "name": "a value", "extra": 1}"#)
        .unwrap();

    assert_eq!(record.get("age").unwrap(), &AttributeValue::from(10));
    assert_eq!(record.get("name").unwrap(), &AttributeValue::from("a value"));
    assert!(!record.contains_key("extra"));
    assert_eq!(record.len(), 2);
    schema.validate(&record).unwrap();
}

#[test]
fn out_of_range_number_names_field_and_reason() {
    let schema = person_schema();
    let record = schema.decode(br#"{"age": 200, "name": "x"}"#).unwrap();

    let err = schema.validate(&record).unwrap_err();
    match err {
        CoreError::Validation {
            key,
            constraint,
            actual,
        } => {
            assert_eq!(key, "age");
            assert_eq!(constraint, "exceeds max=100");
            assert_eq!(actual, "200");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn missing_record_key_is_not_found() {
    let schema = person_schema();
    let record = schema.decode(br#"{"age": 10}"#).unwrap();
    let err = schema.get(&record, "missing-key").unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    // Declared in the schema but absent from the payload: still a miss.
    assert!(matches!(
        schema.get(&record, "name"),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn absent_optional_fields_are_not_defaulted() {
    let schema = person_schema();
    let record = schema.decode(b"{}").unwrap();
    assert!(record.is_empty());
    schema.validate(&record).unwrap();
}

#[test]
fn duplicate_field_keys_fail_to_compile() {
    let err = RecordSchema::compile([
        FieldDefinition::from(NumericField::new("age", "Age")),
        FieldDefinition::from(TextField::new("age", "Age as text")),
    ])
    .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateKey(ref key) if key == "age"));
}

#[test]
fn encode_emits_only_present_fields() {
    let schema = person_schema();
    let record = schema.decode(br#"{"name": "router", "age": null}"#).unwrap();
    let encoded: serde_json::Value = serde_json::from_slice(&schema.encode(&record)).unwrap();
    assert_eq!(encoded, serde_json::json!({"name": "router"}));
}

#[test]
fn compiled_schema_is_shared_across_threads() {
    let schema = person_schema();
    let handles: Vec<_> = (1..=4)
        .map(|age| {
            let schema = schema.clone();
            std::thread::spawn(move || {
                let payload = format!(r#"{{"age": {age}, "name": "worker"}}"#);
                let record = schema.decode(payload.as_bytes()).unwrap();
                schema.validate(&record).is_ok()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
