use super::{
    Attribute, AttributeDef, Entity, EntityId, ID_KEY, OBJ_ID_KEY, id_field, key_field, put_id,
    text,
};
use crate::enums::EntityKind;
use crate::errors::CoreError;
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::value::AttributeValue;

/// Compile the instance schema of a model from its attributes.
///
/// Fields are ordered by attribute index, then property id.
///
/// # Errors
///
/// - `CoreError::Value` if an attribute uses a reserved key or cannot be
///   mapped onto a field
/// - `CoreError::DuplicateKey` if two attributes share a property id
pub fn instance_schema(attributes: &[AttributeDef]) -> Result<RecordSchema, CoreError> {
    let mut ordered: Vec<&AttributeDef> = attributes.iter().collect();
    ordered.sort_by(|a, b| {
        a.index()
            .cmp(&b.index())
            .then_with(|| a.property_id().cmp(b.property_id()))
    });

    let fields = ordered
        .into_iter()
        .map(|attr| {
            if attr.property_id() == ID_KEY || attr.property_id() == OBJ_ID_KEY {
                return Err(CoreError::Value(format!(
                    "attribute key '{}' is reserved",
                    attr.property_id()
                )));
            }
            attr.to_field_definition()
        })
        .collect::<Result<Vec<_>, _>>()?;
    RecordSchema::compile(fields)
}

/// A record of one model, shaped by that model's attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceDef {
    persisted_id: Option<EntityId>,
    object_id: String,
    record: Record,
}

impl InstanceDef {
    #[must_use]
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_record(mut self, record: Record) -> Self {
        self.record = record;
        self
    }

    /// Business key of the owning model.
    #[must_use]
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    #[must_use]
    pub const fn record(&self) -> &Record {
        &self.record
    }

    pub const fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.record.insert(key, value);
    }

    #[must_use]
    pub fn into_record(self) -> Record {
        self.record
    }

    /// Schema of the stored form: `schema` plus the identity and model keys.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DuplicateKey` if `schema` already declares one of
    /// the reserved keys.
    pub fn storage_schema(schema: &RecordSchema) -> Result<RecordSchema, CoreError> {
        schema.with_fields([id_field(), key_field(OBJ_ID_KEY, "Model ID")])
    }
}

impl Entity for InstanceDef {
    const KIND: EntityKind = EntityKind::Instance;

    fn persisted_id(&self) -> Option<EntityId> {
        self.persisted_id
    }

    fn set_persisted_id(&mut self, id: EntityId) {
        self.persisted_id = Some(id);
    }

    fn to_record(&self) -> Record {
        let mut record = self.record.clone().with(OBJ_ID_KEY, self.object_id.as_str());
        put_id(&mut record, self.persisted_id);
        record
    }

    fn from_record(id: EntityId, record: &Record) -> Result<Self, CoreError> {
        let mut values = record.clone();
        values.remove(ID_KEY);
        values.remove(OBJ_ID_KEY);
        Ok(Self {
            persisted_id: Some(id),
            object_id: text(record, OBJ_ID_KEY),
            record: values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::PropertyType;
    use crate::metamodel::{Model, ModelDef};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn attribute(model: &ModelDef, key: &str, ty: PropertyType, index: i64) -> AttributeDef {
        let mut attr = model.create_attribute();
        attr.set_property_id(key);
        attr.set_name(key);
        attr.set_property_type(ty);
        attr.set_index(index);
        attr
    }

    #[test]
    fn schema_follows_attribute_index() {
        let host = ModelDef::new("host", "Host");
        let schema = instance_schema(&[
            attribute(&host, "os", PropertyType::SingleChar, 2),
            attribute(&host, "cpu", PropertyType::Int, 1),
            attribute(&host, "arch", PropertyType::SingleChar, 2),
        ])
        .unwrap();
        let keys: Vec<&str> = schema.fields().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["cpu", "arch", "os"]);
    }

    #[test]
    fn reserved_keys_are_rejected() {
        let host = ModelDef::new("host", "Host");
        let err = instance_schema(&[attribute(&host, "id", PropertyType::Int, 0)]).unwrap_err();
        assert!(matches!(err, CoreError::Value(_)));
    }

    #[test]
    fn duplicate_property_ids_are_rejected() {
        let host = ModelDef::new("host", "Host");
        let err = instance_schema(&[
            attribute(&host, "ip", PropertyType::SingleChar, 0),
            attribute(&host, "ip", PropertyType::LongChar, 1),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey(_)));
    }

    #[test]
    fn stored_form_adds_model_and_identity() {
        let host = ModelDef::new("host", "Host");
        let schema = instance_schema(&[attribute(&host, "cpu", PropertyType::Int, 0)]).unwrap();
        let storage = InstanceDef::storage_schema(&schema).unwrap();

        let mut instance = host.create_instance();
        instance.set("cpu", 8);
        instance.set_persisted_id(EntityId(5));

        let record = instance.to_record();
        storage.validate(&record).unwrap();
        assert_eq!(record.to_json(), json!({"cpu": 8, "bk_obj_id": "host", "id": 5}));

        let back = InstanceDef::from_record(EntityId(5), &record).unwrap();
        assert_eq!(back, instance);
    }
}
