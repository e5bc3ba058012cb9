use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    AttributeDef, Entity, EntityId, EntityIter, GroupDef, InstanceDef, OBJ_ID_KEY, find_children,
    flag, flag_field, id_field, instance_schema, key_field, put_id, text, text_field,
};
use crate::enums::{EntityKind, LONG_CHAR_MAX_LEN};
use crate::errors::CoreError;
use crate::field::TextField;
use crate::filter::Filter;
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::store::MetaStore;

pub(super) const CLASSIFICATION_KEY: &str = "bk_classification_id";
const NAME_KEY: &str = "bk_obj_name";
const ICON_KEY: &str = "bk_obj_icon";
const POSITION_KEY: &str = "position";
const PAUSED_KEY: &str = "bk_ispaused";
const DESCRIPTION_KEY: &str = "description";

static SCHEMA: LazyLock<RecordSchema> = LazyLock::new(|| {
    RecordSchema::must_compile([
        id_field(),
        key_field(OBJ_ID_KEY, "Model ID"),
        text_field(NAME_KEY, "Model name"),
        key_field(CLASSIFICATION_KEY, "Classification ID"),
        text_field(ICON_KEY, "Model icon"),
        TextField::new(POSITION_KEY, "Position")
            .max_length(LONG_CHAR_MAX_LEN)
            .editable(true)
            .into(),
        flag_field(PAUSED_KEY, "Paused"),
        TextField::new(DESCRIPTION_KEY, "Description")
            .max_length(LONG_CHAR_MAX_LEN)
            .editable(true)
            .into(),
    ])
});

pub(super) fn schema() -> &'static RecordSchema {
    &SCHEMA
}

/// A user-defined object type.
pub trait Model {
    fn object_id(&self) -> &str;
    fn set_object_id(&mut self, id: &str);

    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);

    fn classification_id(&self) -> &str;
    fn set_classification_id(&mut self, id: &str);

    fn icon(&self) -> &str;
    fn set_icon(&mut self, icon: &str);

    fn position(&self) -> &str;
    fn set_position(&mut self, position: &str);

    fn paused(&self) -> bool;
    fn set_paused(&mut self, paused: bool);

    fn description(&self) -> &str;
    fn set_description(&mut self, description: &str);

    /// New unsaved attribute group of this model.
    fn create_group(&self) -> GroupDef;

    /// New unsaved attribute of this model, outside any group.
    fn create_attribute(&self) -> AttributeDef;

    /// New unsaved, empty instance of this model.
    fn create_instance(&self) -> InstanceDef;

    /// # Errors
    ///
    /// Returns the store's error if the query cannot start.
    fn find_groups(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<GroupDef>, CoreError>;

    /// # Errors
    ///
    /// Returns the store's error if the query cannot start.
    fn find_attributes(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<AttributeDef>, CoreError>;

    /// # Errors
    ///
    /// Returns the store's error if the query cannot start.
    fn find_instances(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<InstanceDef>, CoreError>;

    /// Schema for instances of this model, derived from its current
    /// attributes.
    ///
    /// # Errors
    ///
    /// Returns the store's error, or `CoreError::Value` if an attribute
    /// cannot be mapped onto a field.
    fn instance_schema(&self, store: &dyn MetaStore) -> Result<RecordSchema, CoreError> {
        let attributes = self
            .find_attributes(store, &Filter::new())?
            .collect_all()?;
        instance_schema(&attributes)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ModelDef {
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    persisted_id: Option<EntityId>,
    #[serde(rename = "bk_obj_id")]
    object_id: String,
    #[serde(rename = "bk_obj_name", default)]
    name: String,
    #[serde(rename = "bk_classification_id")]
    classification_id: String,
    #[serde(rename = "bk_obj_icon", default)]
    icon: String,
    #[serde(default)]
    position: String,
    #[serde(rename = "bk_ispaused", default)]
    paused: bool,
    #[serde(default)]
    description: String,
}

impl ModelDef {
    #[must_use]
    pub fn new(object_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub(super) fn in_classification(classification_id: &str) -> Self {
        Self {
            classification_id: classification_id.to_string(),
            ..Self::default()
        }
    }
}

impl Model for ModelDef {
    fn object_id(&self) -> &str {
        &self.object_id
    }

    fn set_object_id(&mut self, id: &str) {
        self.object_id = id.to_string();
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn classification_id(&self) -> &str {
        &self.classification_id
    }

    fn set_classification_id(&mut self, id: &str) {
        self.classification_id = id.to_string();
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn set_icon(&mut self, icon: &str) {
        self.icon = icon.to_string();
    }

    fn position(&self) -> &str {
        &self.position
    }

    fn set_position(&mut self, position: &str) {
        self.position = position.to_string();
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    fn create_group(&self) -> GroupDef {
        GroupDef::in_model(&self.object_id)
    }

    fn create_attribute(&self) -> AttributeDef {
        AttributeDef::in_model(&self.object_id, "")
    }

    fn create_instance(&self) -> InstanceDef {
        InstanceDef::new(&self.object_id)
    }

    fn find_groups(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<GroupDef>, CoreError> {
        find_children(store, OBJ_ID_KEY, &self.object_id, filter)
    }

    fn find_attributes(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<AttributeDef>, CoreError> {
        find_children(store, OBJ_ID_KEY, &self.object_id, filter)
    }

    fn find_instances(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<InstanceDef>, CoreError> {
        find_children(store, OBJ_ID_KEY, &self.object_id, filter)
    }
}

impl Entity for ModelDef {
    const KIND: EntityKind = EntityKind::Model;

    fn persisted_id(&self) -> Option<EntityId> {
        self.persisted_id
    }

    fn set_persisted_id(&mut self, id: EntityId) {
        self.persisted_id = Some(id);
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with(OBJ_ID_KEY, self.object_id.as_str())
            .with(NAME_KEY, self.name.as_str())
            .with(CLASSIFICATION_KEY, self.classification_id.as_str())
            .with(ICON_KEY, self.icon.as_str())
            .with(POSITION_KEY, self.position.as_str())
            .with(PAUSED_KEY, self.paused)
            .with(DESCRIPTION_KEY, self.description.as_str());
        put_id(&mut record, self.persisted_id);
        record
    }

    fn from_record(id: EntityId, record: &Record) -> Result<Self, CoreError> {
        Ok(Self {
            persisted_id: Some(id),
            object_id: text(record, OBJ_ID_KEY),
            name: text(record, NAME_KEY),
            classification_id: text(record, CLASSIFICATION_KEY),
            icon: text(record, ICON_KEY),
            position: text(record, POSITION_KEY),
            paused: flag(record, PAUSED_KEY),
            description: text(record, DESCRIPTION_KEY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{Attribute, Group};
    use pretty_assertions::assert_eq;

    fn switch() -> ModelDef {
        let mut model = ModelDef::new("switch", "Switch");
        model.set_classification_id("net_device");
        model
    }

    #[test]
    fn create_attribute_defaults() {
        let attr = switch().create_attribute();
        assert_eq!(attr.object_id(), "switch");
        assert_eq!(attr.property_id(), "");
        assert_eq!(attr.group_id(), "");
        assert!(!attr.editable());
        assert!(!attr.required());
        assert_eq!(attr.persisted_id(), None);
    }

    #[test]
    fn create_group_and_instance_are_prelinked() {
        let model = switch();
        assert_eq!(model.create_group().object_id(), "switch");
        let instance = model.create_instance();
        assert_eq!(instance.object_id(), "switch");
        assert!(instance.record().is_empty());
    }

    #[test]
    fn record_codec_keeps_fields() {
        let mut model = switch();
        model.set_paused(true);
        model.set_position(r#"{"x":1,"y":2}"#);
        model.set_description("Layer 2 switches");
        model.set_persisted_id(EntityId(11));

        let record = model.to_record();
        schema().validate(&record).unwrap();
        assert_eq!(ModelDef::from_record(EntityId(11), &record).unwrap(), model);
    }

    #[test]
    fn model_without_classification_fails_schema() {
        let record = ModelDef::new("router", "Router").to_record();
        let err = schema().validate(&record).unwrap_err();
        assert_eq!(err.field_key(), Some(CLASSIFICATION_KEY));
    }
}
