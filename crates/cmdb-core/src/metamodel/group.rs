use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    AttributeDef, Entity, EntityId, EntityIter, OBJ_ID_KEY, flag, flag_field, id_field, integer,
    key_field, put_id, text, text_field,
};
use crate::enums::EntityKind;
use crate::errors::CoreError;
use crate::field::NumericField;
use crate::filter::Filter;
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::store::MetaStore;

pub(super) const GROUP_ID_KEY: &str = "bk_group_id";
const NAME_KEY: &str = "bk_group_name";
const INDEX_KEY: &str = "bk_group_index";
const DEFAULT_KEY: &str = "bk_isdefault";
const COLLAPSE_KEY: &str = "is_collapse";

static SCHEMA: LazyLock<RecordSchema> = LazyLock::new(|| {
    RecordSchema::must_compile([
        id_field(),
        key_field(GROUP_ID_KEY, "Group ID"),
        text_field(NAME_KEY, "Group name"),
        NumericField::new(INDEX_KEY, "Group index").editable(true).into(),
        key_field(OBJ_ID_KEY, "Model ID"),
        flag_field(DEFAULT_KEY, "Default group"),
        flag_field(COLLAPSE_KEY, "Collapsed"),
    ])
});

pub(super) fn schema() -> &'static RecordSchema {
    &SCHEMA
}

/// A named grouping of attributes within one model.
pub trait Group {
    fn group_id(&self) -> &str;
    fn set_group_id(&mut self, id: &str);

    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);

    fn index(&self) -> i64;
    fn set_index(&mut self, index: i64);

    /// Business key of the owning model.
    fn object_id(&self) -> &str;
    fn set_object_id(&mut self, id: &str);

    fn is_default(&self) -> bool;
    fn set_default(&mut self, is_default: bool);

    fn collapsed(&self) -> bool;
    fn set_collapsed(&mut self, collapsed: bool);

    /// New unsaved attribute linked to this group and its model.
    fn create_attribute(&self) -> AttributeDef;

    /// Attributes placed in this group that also match `filter`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query cannot start.
    fn find_attributes(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<AttributeDef>, CoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupDef {
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    persisted_id: Option<EntityId>,
    #[serde(rename = "bk_group_id")]
    group_id: String,
    #[serde(rename = "bk_group_name", default)]
    name: String,
    #[serde(rename = "bk_group_index", default)]
    index: i64,
    #[serde(rename = "bk_obj_id")]
    object_id: String,
    #[serde(rename = "bk_isdefault", default)]
    is_default: bool,
    #[serde(rename = "is_collapse", default)]
    collapsed: bool,
}

impl GroupDef {
    pub(super) fn in_model(object_id: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            ..Self::default()
        }
    }
}

impl Group for GroupDef {
    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn set_group_id(&mut self, id: &str) {
        self.group_id = id.to_string();
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn index(&self) -> i64 {
        self.index
    }

    fn set_index(&mut self, index: i64) {
        self.index = index;
    }

    fn object_id(&self) -> &str {
        &self.object_id
    }

    fn set_object_id(&mut self, id: &str) {
        self.object_id = id.to_string();
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }

    fn collapsed(&self) -> bool {
        self.collapsed
    }

    fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    fn create_attribute(&self) -> AttributeDef {
        AttributeDef::in_model(&self.object_id, &self.group_id)
    }

    fn find_attributes(
        &self,
        store: &dyn MetaStore,
        filter: &Filter,
    ) -> Result<EntityIter<AttributeDef>, CoreError> {
        let scoped = filter
            .clone()
            .eq(OBJ_ID_KEY, self.object_id.as_str())
            .eq(super::attribute::GROUP_KEY, self.group_id.as_str());
        store
            .query(AttributeDef::KIND, &scoped)
            .map(EntityIter::new)
    }
}

impl Entity for GroupDef {
    const KIND: EntityKind = EntityKind::Group;

    fn persisted_id(&self) -> Option<EntityId> {
        self.persisted_id
    }

    fn set_persisted_id(&mut self, id: EntityId) {
        self.persisted_id = Some(id);
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with(GROUP_ID_KEY, self.group_id.as_str())
            .with(NAME_KEY, self.name.as_str())
            .with(INDEX_KEY, self.index)
            .with(OBJ_ID_KEY, self.object_id.as_str())
            .with(DEFAULT_KEY, self.is_default)
            .with(COLLAPSE_KEY, self.collapsed);
        put_id(&mut record, self.persisted_id);
        record
    }

    fn from_record(id: EntityId, record: &Record) -> Result<Self, CoreError> {
        Ok(Self {
            persisted_id: Some(id),
            group_id: text(record, GROUP_ID_KEY),
            name: text(record, NAME_KEY),
            index: integer(record, INDEX_KEY),
            object_id: text(record, OBJ_ID_KEY),
            is_default: flag(record, DEFAULT_KEY),
            collapsed: flag(record, COLLAPSE_KEY),
        })
    }
}
