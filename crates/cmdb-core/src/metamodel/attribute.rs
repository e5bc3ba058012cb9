use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    Entity, EntityId, OBJ_ID_KEY, flag, flag_field, id_field, integer, key_field, put_id, text,
    text_field,
};
use crate::enums::{EntityKind, LONG_CHAR_MAX_LEN, PropertyType, SINGLE_CHAR_MAX_LEN};
use crate::errors::CoreError;
use crate::field::{FieldConstraints, FieldDefinition, NumericField, TextField};
use crate::record::Record;
use crate::schema::RecordSchema;

pub(super) const PROPERTY_KEY: &str = "bk_property_id";
pub(super) const GROUP_KEY: &str = "bk_property_group";
const NAME_KEY: &str = "bk_property_name";
const INDEX_KEY: &str = "bk_property_index";
const UNIT_KEY: &str = "unit";
const PLACEHOLDER_KEY: &str = "placeholder";
const EDITABLE_KEY: &str = "editable";
const REQUIRED_KEY: &str = "isrequired";
const READONLY_KEY: &str = "isreadonly";
const UNIQUE_KEY: &str = "isonly";
const SYSTEM_KEY: &str = "bk_issystem";
const API_KEY: &str = "bk_isapi";
const TYPE_KEY: &str = "bk_property_type";
const OPTION_KEY: &str = "option";
const DESCRIPTION_KEY: &str = "description";

static SCHEMA: LazyLock<RecordSchema> = LazyLock::new(|| {
    let long_text = |key: &str, name: &str| -> FieldDefinition {
        TextField::new(key, name)
            .max_length(LONG_CHAR_MAX_LEN)
            .editable(true)
            .into()
    };
    RecordSchema::must_compile([
        id_field(),
        key_field(OBJ_ID_KEY, "Model ID"),
        key_field(PROPERTY_KEY, "Property ID"),
        text_field(NAME_KEY, "Property name"),
        text_field(GROUP_KEY, "Property group"),
        NumericField::new(INDEX_KEY, "Property index")
            .editable(true)
            .into(),
        text_field(UNIT_KEY, "Unit"),
        long_text(PLACEHOLDER_KEY, "Placeholder"),
        flag_field(EDITABLE_KEY, "Editable"),
        flag_field(REQUIRED_KEY, "Required"),
        flag_field(READONLY_KEY, "Read only"),
        flag_field(UNIQUE_KEY, "Unique"),
        flag_field(SYSTEM_KEY, "System"),
        flag_field(API_KEY, "API managed"),
        key_field(TYPE_KEY, "Property type"),
        long_text(OPTION_KEY, "Option"),
        long_text(DESCRIPTION_KEY, "Description"),
    ])
});

pub(super) fn schema() -> &'static RecordSchema {
    &SCHEMA
}

/// A single named, typed field of a model.
///
/// Setters change exactly one value and never re-check other fields.
/// Consistency is checked when the attribute is saved.
pub trait Attribute {
    fn property_id(&self) -> &str;
    fn set_property_id(&mut self, id: &str);

    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);

    /// Business key of the owning model.
    fn object_id(&self) -> &str;
    fn set_object_id(&mut self, id: &str);

    /// Owning group, empty when ungrouped.
    fn group_id(&self) -> &str;
    fn set_group_id(&mut self, id: &str);

    fn index(&self) -> i64;
    fn set_index(&mut self, index: i64);

    fn unit(&self) -> &str;
    fn set_unit(&mut self, unit: &str);

    fn placeholder(&self) -> &str;
    fn set_placeholder(&mut self, placeholder: &str);

    fn editable(&self) -> bool;
    fn set_editable(&mut self, editable: bool);

    fn required(&self) -> bool;
    fn set_required(&mut self, required: bool);

    fn read_only(&self) -> bool;
    fn set_read_only(&mut self, read_only: bool);

    /// Instance values of a unique attribute may not repeat within a model.
    fn unique(&self) -> bool;
    fn set_unique(&mut self, unique: bool);

    fn system(&self) -> bool;
    fn set_system(&mut self, system: bool);

    fn api(&self) -> bool;
    fn set_api(&mut self, api: bool);

    fn property_type(&self) -> &PropertyType;
    fn set_property_type(&mut self, ty: PropertyType);

    /// Type-specific option payload: `{"min", "max"}` for numbers, a regex
    /// string for text.
    fn option(&self) -> &Value;
    fn set_option(&mut self, option: Value);

    fn description(&self) -> &str;
    fn set_description(&mut self, description: &str);

    /// Map this attribute onto an instance field.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Value` for property types without a field mapping
    /// and for malformed options.
    fn to_field_definition(&self) -> Result<FieldDefinition, CoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttributeDef {
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    persisted_id: Option<EntityId>,
    #[serde(rename = "bk_obj_id")]
    object_id: String,
    #[serde(rename = "bk_property_id")]
    property_id: String,
    #[serde(rename = "bk_property_name", default)]
    name: String,
    #[serde(rename = "bk_property_group", default)]
    group_id: String,
    #[serde(rename = "bk_property_index", default)]
    index: i64,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    placeholder: String,
    #[serde(default)]
    editable: bool,
    #[serde(rename = "isrequired", default)]
    required: bool,
    #[serde(rename = "isreadonly", default)]
    read_only: bool,
    #[serde(rename = "isonly", default)]
    unique: bool,
    #[serde(rename = "bk_issystem", default)]
    system: bool,
    #[serde(rename = "bk_isapi", default)]
    api: bool,
    #[serde(rename = "bk_property_type", default)]
    #[schemars(with = "String")]
    property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    option: Value,
    #[serde(default)]
    description: String,
}

impl AttributeDef {
    pub(super) fn in_model(object_id: &str, group_id: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            group_id: group_id.to_string(),
            ..Self::default()
        }
    }
}

impl Attribute for AttributeDef {
    fn property_id(&self) -> &str {
        &self.property_id
    }

    fn set_property_id(&mut self, id: &str) {
        self.property_id = id.to_string();
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn object_id(&self) -> &str {
        &self.object_id
    }

    fn set_object_id(&mut self, id: &str) {
        self.object_id = id.to_string();
    }

    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn set_group_id(&mut self, id: &str) {
        self.group_id = id.to_string();
    }

    fn index(&self) -> i64 {
        self.index
    }

    fn set_index(&mut self, index: i64) {
        self.index = index;
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn set_unit(&mut self, unit: &str) {
        self.unit = unit.to_string();
    }

    fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn set_placeholder(&mut self, placeholder: &str) {
        self.placeholder = placeholder.to_string();
    }

    fn editable(&self) -> bool {
        self.editable
    }

    fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    fn required(&self) -> bool {
        self.required
    }

    fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn unique(&self) -> bool {
        self.unique
    }

    fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }

    fn system(&self) -> bool {
        self.system
    }

    fn set_system(&mut self, system: bool) {
        self.system = system;
    }

    fn api(&self) -> bool {
        self.api
    }

    fn set_api(&mut self, api: bool) {
        self.api = api;
    }

    fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    fn set_property_type(&mut self, ty: PropertyType) {
        self.property_type = ty;
    }

    fn option(&self) -> &Value {
        &self.option
    }

    fn set_option(&mut self, option: Value) {
        self.option = option;
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    fn to_field_definition(&self) -> Result<FieldDefinition, CoreError> {
        let constraints = match &self.property_type {
            PropertyType::Int | PropertyType::Float => {
                let (min, max) = numeric_bounds(&self.option)
                    .map_err(|e| self.option_error(&e))?;
                FieldConstraints::Numeric { min, max }
            }
            PropertyType::SingleChar => self.text_constraints(SINGLE_CHAR_MAX_LEN)?,
            PropertyType::LongChar => self.text_constraints(LONG_CHAR_MAX_LEN)?,
            PropertyType::Bool => FieldConstraints::Bool,
            PropertyType::Time => FieldConstraints::Time,
            PropertyType::Other(name) => {
                return Err(CoreError::Value(format!(
                    "property type '{name}' of attribute '{}' has no field mapping",
                    self.property_id
                )));
            }
        };
        Ok(FieldDefinition {
            key: self.property_id.clone(),
            name: self.name.clone(),
            editable: self.editable,
            required: self.required,
            constraints,
        })
    }
}

impl AttributeDef {
    fn text_constraints(&self, max_length: usize) -> Result<FieldConstraints, CoreError> {
        let regex = match &self.option {
            Value::Null => None,
            Value::String(pattern) if pattern.is_empty() => None,
            Value::String(pattern) => Some(pattern.clone()),
            other => {
                return Err(self.option_error(&format!("expected a regex string, got {other}")));
            }
        };
        Ok(FieldConstraints::Text {
            min_length: None,
            max_length: Some(max_length),
            regex,
        })
    }

    fn option_error(&self, reason: &str) -> CoreError {
        CoreError::Value(format!(
            "invalid option for attribute '{}': {reason}",
            self.property_id
        ))
    }
}

/// `{"min", "max"}` bounds. Missing, null, or empty-string bounds are open.
fn numeric_bounds(option: &Value) -> Result<(Option<f64>, Option<f64>), String> {
    match option {
        Value::Null => Ok((None, None)),
        Value::String(raw) if raw.trim().is_empty() => Ok((None, None)),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ Value::Object(_)) => numeric_bounds(&parsed),
            _ => Err(format!("expected a {{\"min\", \"max\"}} object, got {raw}")),
        },
        Value::Object(map) => Ok((bound(map.get("min"))?, bound(map.get("max"))?)),
        other => Err(format!("expected a {{\"min\", \"max\"}} object, got {other}")),
    }
}

fn bound(value: Option<&Value>) -> Result<Option<f64>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("bound '{s}' is not a number")),
        Some(other) => Err(format!("bound {other} is not a number")),
    }
}

impl Entity for AttributeDef {
    const KIND: EntityKind = EntityKind::Attribute;

    fn persisted_id(&self) -> Option<EntityId> {
        self.persisted_id
    }

    fn set_persisted_id(&mut self, id: EntityId) {
        self.persisted_id = Some(id);
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with(OBJ_ID_KEY, self.object_id.as_str())
            .with(PROPERTY_KEY, self.property_id.as_str())
            .with(NAME_KEY, self.name.as_str())
            .with(GROUP_KEY, self.group_id.as_str())
            .with(INDEX_KEY, self.index)
            .with(UNIT_KEY, self.unit.as_str())
            .with(PLACEHOLDER_KEY, self.placeholder.as_str())
            .with(EDITABLE_KEY, self.editable)
            .with(REQUIRED_KEY, self.required)
            .with(READONLY_KEY, self.read_only)
            .with(UNIQUE_KEY, self.unique)
            .with(SYSTEM_KEY, self.system)
            .with(API_KEY, self.api)
            .with(TYPE_KEY, self.property_type.as_str())
            .with(DESCRIPTION_KEY, self.description.as_str());
        if !self.option.is_null() {
            record.insert(OPTION_KEY, self.option.to_string());
        }
        put_id(&mut record, self.persisted_id);
        record
    }

    fn from_record(id: EntityId, record: &Record) -> Result<Self, CoreError> {
        let option = match record.value(OPTION_KEY) {
            None => Value::Null,
            Some(stored) => {
                let raw = stored.to_string();
                serde_json::from_str(&raw).unwrap_or(Value::String(raw))
            }
        };
        Ok(Self {
            persisted_id: Some(id),
            object_id: text(record, OBJ_ID_KEY),
            property_id: text(record, PROPERTY_KEY),
            name: text(record, NAME_KEY),
            group_id: text(record, GROUP_KEY),
            index: integer(record, INDEX_KEY),
            unit: text(record, UNIT_KEY),
            placeholder: text(record, PLACEHOLDER_KEY),
            editable: flag(record, EDITABLE_KEY),
            required: flag(record, REQUIRED_KEY),
            read_only: flag(record, READONLY_KEY),
            unique: flag(record, UNIQUE_KEY),
            system: flag(record, SYSTEM_KEY),
            api: flag(record, API_KEY),
            property_type: PropertyType::from(text(record, TYPE_KEY)),
            option,
            description: text(record, DESCRIPTION_KEY),
        })
    }
}
