//! The Classification → Model → Group → Attribute → Instance hierarchy.
//!
//! Each entity kind is a small trait (`Classification`, `Model`, `Group`,
//! `Attribute`) implemented by a concrete `*Def` type with private state.
//! `create_*` helpers return unsaved children pre-linked to their parent's
//! business key. `find_*` helpers read lazily through a `MetaStore`.
//!
//! Every `*Def` converts to and from a `Record` using a built-in
//! `RecordSchema` for its kind, keyed by the stored document names
//! (`bk_obj_id`, `bk_property_id`, ...).

mod attribute;
mod classification;
mod group;
mod instance;
mod iter;
mod model;

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EntityKind;
use crate::errors::CoreError;
use crate::field::{FieldDefinition, NumericField, TextField};
use crate::filter::Filter;
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::store::MetaStore;
use crate::value::AttributeValue;

pub use attribute::{Attribute, AttributeDef};
pub use classification::{Classification, ClassificationDef};
pub use group::{Group, GroupDef};
pub use instance::{InstanceDef, instance_schema};
pub use iter::EntityIter;
pub use model::{Model, ModelDef};

/// Record key holding the persisted identity.
pub const ID_KEY: &str = "id";

/// Record key linking groups, attributes, and instances to their model.
pub const OBJ_ID_KEY: &str = "bk_obj_id";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identity assigned by the `MetaStore` on first save.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Identity stored under `ID_KEY`, if any.
    #[must_use]
    pub fn from_record(record: &Record) -> Option<Self> {
        record
            .value(ID_KEY)
            .and_then(|v| match v {
                AttributeValue::Number(n) => n.as_u64().map(Self),
                _ => None,
            })
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<EntityId> for AttributeValue {
    fn from(id: EntityId) -> Self {
        Self::from(id.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A persisted metamodel type with a `Record` codec.
pub trait Entity: Sized {
    const KIND: EntityKind;

    /// `None` until the entity has been saved.
    fn persisted_id(&self) -> Option<EntityId>;

    fn set_persisted_id(&mut self, id: EntityId);

    /// Stored form. Includes `ID_KEY` once the entity has an identity.
    fn to_record(&self) -> Record;

    /// Rebuild an entity from its stored form.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the record cannot represent this kind.
    fn from_record(id: EntityId, record: &Record) -> Result<Self, CoreError>;
}

/// Built-in storage schema for a metamodel kind. Instances have no built-in
/// schema; theirs is derived from their model's attributes.
#[must_use]
pub fn builtin_schema(kind: EntityKind) -> Option<&'static RecordSchema> {
    match kind {
        EntityKind::Classification => Some(classification::schema()),
        EntityKind::Model => Some(model::schema()),
        EntityKind::Group => Some(group::schema()),
        EntityKind::Attribute => Some(attribute::schema()),
        EntityKind::Instance => None,
    }
}

/// Query `T` records restricted to one parent key.
fn find_children<T: Entity>(
    store: &dyn MetaStore,
    parent_key: &str,
    parent_value: &str,
    filter: &Filter,
) -> Result<EntityIter<T>, CoreError> {
    let scoped = filter.clone().eq(parent_key, parent_value);
    store.query(T::KIND, &scoped).map(EntityIter::new)
}

// --- Record helpers ---

fn id_field() -> FieldDefinition {
    NumericField::new(ID_KEY, "ID").min(0.0).into()
}

fn key_field(key: &str, name: &str) -> FieldDefinition {
    TextField::new(key, name)
        .min_length(1)
        .max_length(crate::enums::SINGLE_CHAR_MAX_LEN)
        .required(true)
        .into()
}

fn text_field(key: &str, name: &str) -> FieldDefinition {
    TextField::new(key, name)
        .max_length(crate::enums::SINGLE_CHAR_MAX_LEN)
        .editable(true)
        .into()
}

fn flag_field(key: &str, name: &str) -> FieldDefinition {
    FieldDefinition::bool(key, name).editable(true)
}

fn put_id(record: &mut Record, id: Option<EntityId>) {
    if let Some(id) = id {
        record.insert(ID_KEY, id);
    }
}

fn text(record: &Record, key: &str) -> String {
    record
        .value(key)
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn flag(record: &Record, key: &str) -> bool {
    record.value(key).is_some_and(AttributeValue::as_bool)
}

fn integer(record: &Record, key: &str) -> i64 {
    record.value(key).map_or(0, AttributeValue::as_i64)
}
