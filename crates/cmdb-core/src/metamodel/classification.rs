use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::model::{CLASSIFICATION_KEY, ModelDef};
use super::{
    Entity, EntityId, EntityIter, find_children, id_field, key_field, put_id, text, text_field,
};
use crate::enums::EntityKind;
use crate::errors::CoreError;
use crate::filter::Filter;
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::store::MetaStore;

const NAME_KEY: &str = "bk_classification_name";
const TYPE_KEY: &str = "bk_classification_type";
const ICON_KEY: &str = "bk_classification_icon";

static SCHEMA: LazyLock<RecordSchema> = LazyLock::new(|| {
    RecordSchema::must_compile([
        id_field(),
        key_field(CLASSIFICATION_KEY, "Classification ID"),
        text_field(NAME_KEY, "Classification name"),
        text_field(TYPE_KEY, "Classification type"),
        text_field(ICON_KEY, "Classification icon"),
    ])
});

pub(super) fn schema() -> &'static RecordSchema {
    &SCHEMA
}

/// A named grouping of models.
pub trait Classification {
    fn classification_id(&self) -> &str;
    fn set_classification_id(&mut self, id: &str);

    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);

    fn classification_type(&self) -> &str;
    fn set_classification_type(&mut self, ty: &str);

    fn icon(&self) -> &str;
    fn set_icon(&mut self, icon: &str);

    /// New unsaved model linked to this classification.
    fn create_model(&self) -> ModelDef;

    /// Models of this classification that also match `filter`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query cannot start.
    fn find_models(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<ModelDef>, CoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationDef {
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    persisted_id: Option<EntityId>,
    #[serde(rename = "bk_classification_id")]
    classification_id: String,
    #[serde(rename = "bk_classification_name", default)]
    name: String,
    #[serde(rename = "bk_classification_type", default)]
    classification_type: String,
    #[serde(rename = "bk_classification_icon", default)]
    icon: String,
}

impl ClassificationDef {
    #[must_use]
    pub fn new(classification_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            classification_id: classification_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Classification for ClassificationDef {
    fn classification_id(&self) -> &str {
        &self.classification_id
    }

    fn set_classification_id(&mut self, id: &str) {
        self.classification_id = id.to_string();
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn classification_type(&self) -> &str {
        &self.classification_type
    }

    fn set_classification_type(&mut self, ty: &str) {
        self.classification_type = ty.to_string();
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn set_icon(&mut self, icon: &str) {
        self.icon = icon.to_string();
    }

    fn create_model(&self) -> ModelDef {
        ModelDef::in_classification(&self.classification_id)
    }

    fn find_models(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<ModelDef>, CoreError> {
        find_children(store, CLASSIFICATION_KEY, &self.classification_id, filter)
    }
}

impl Entity for ClassificationDef {
    const KIND: EntityKind = EntityKind::Classification;

    fn persisted_id(&self) -> Option<EntityId> {
        self.persisted_id
    }

    fn set_persisted_id(&mut self, id: EntityId) {
        self.persisted_id = Some(id);
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with(CLASSIFICATION_KEY, self.classification_id.as_str())
            .with(NAME_KEY, self.name.as_str())
            .with(TYPE_KEY, self.classification_type.as_str())
            .with(ICON_KEY, self.icon.as_str());
        put_id(&mut record, self.persisted_id);
        record
    }

    fn from_record(id: EntityId, record: &Record) -> Result<Self, CoreError> {
        Ok(Self {
            persisted_id: Some(id),
            classification_id: text(record, CLASSIFICATION_KEY),
            name: text(record, NAME_KEY),
            classification_type: text(record, TYPE_KEY),
            icon: text(record, ICON_KEY),
        })
    }
}
