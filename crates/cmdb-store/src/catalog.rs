//! Catalog service: integrity-checked saves over any `MetaStore`.
//!
//! `Catalog` validates every entity against its storage schema, checks that
//! the parents it references exist, and keeps business keys unique within
//! their scope. Instances are validated against the schema derived from
//! their model's current attributes.
//!
//! Deletes do not cascade; removing a model leaves its groups, attributes,
//! and instances in place.

use cmdb_core::enums::EntityKind;
use cmdb_core::metamodel::{
    Attribute, AttributeDef, Classification, ClassificationDef, Group, GroupDef, InstanceDef,
    Model, ModelDef, OBJ_ID_KEY, builtin_schema, instance_schema,
};
use cmdb_core::{CoreError, Entity, EntityId, Filter, MetaStore, Record, RecordSchema};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::memory::MemoryStore;

const CLASSIFICATION_KEY: &str = "bk_classification_id";
const GROUP_KEY: &str = "bk_group_id";
const PROPERTY_KEY: &str = "bk_property_id";

/// Integrity-checking facade over a metamodel store.
#[derive(Debug, Default)]
pub struct Catalog<S: MetaStore = MemoryStore> {
    store: S,
}

impl<S: MetaStore> Catalog<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }

    // -----------------------------------------------------------------------
    // Saves
    // -----------------------------------------------------------------------

    /// Save a classification. Its id must be unique.
    ///
    /// # Errors
    ///
    /// - `CoreError::Validation` if the stored form violates its schema
    /// - `CoreError::DuplicateKey` if another classification has the same id
    pub fn save_classification(
        &self,
        classification: &mut ClassificationDef,
    ) -> Result<EntityId, StoreError> {
        validate_builtin(&*classification)?;
        let key = classification.classification_id().to_string();
        self.ensure_unique(
            &*classification,
            Filter::new().eq(CLASSIFICATION_KEY, key.as_str()),
            &key,
        )?;
        self.persist(classification, &key)
    }

    /// Save a model. Its classification must exist and its object id must be
    /// unique.
    ///
    /// # Errors
    ///
    /// - `CoreError::Validation` if the stored form violates its schema
    /// - `StoreError::Integrity` if the classification does not exist
    /// - `CoreError::DuplicateKey` if another model has the same object id
    pub fn save_model(&self, model: &mut ModelDef) -> Result<EntityId, StoreError> {
        validate_builtin(&*model)?;
        let key = model.object_id().to_string();
        if self.classification(model.classification_id())?.is_none() {
            return Err(StoreError::integrity(
                EntityKind::Model,
                &key,
                format!("classification '{}'", model.classification_id()),
            ));
        }
        self.ensure_unique(&*model, Filter::new().eq(OBJ_ID_KEY, key.as_str()), &key)?;
        self.persist(model, &key)
    }

    /// Save an attribute group. Its model must exist and its group id must be
    /// unique within that model.
    ///
    /// # Errors
    ///
    /// - `CoreError::Validation` if the stored form violates its schema
    /// - `StoreError::Integrity` if the model does not exist
    /// - `CoreError::DuplicateKey` if the model already has this group id
    pub fn save_group(&self, group: &mut GroupDef) -> Result<EntityId, StoreError> {
        validate_builtin(&*group)?;
        let key = format!("{}.{}", group.object_id(), group.group_id());
        self.require_model(EntityKind::Group, group.object_id(), &key)?;
        self.ensure_unique(
            &*group,
            Filter::new()
                .eq(OBJ_ID_KEY, group.object_id())
                .eq(GROUP_KEY, group.group_id()),
            &key,
        )?;
        self.persist(group, &key)
    }

    /// Save an attribute. Its model must exist, its group (when set) must
    /// exist on that model, and its property id must be unique within the
    /// model.
    ///
    /// # Errors
    ///
    /// - `CoreError::Validation` if the stored form violates its schema
    /// - `CoreError::Value` if the attribute cannot become an instance field
    /// - `StoreError::Integrity` if the model or group does not exist
    /// - `CoreError::DuplicateKey` if the model already has this property id
    pub fn save_attribute(&self, attribute: &mut AttributeDef) -> Result<EntityId, StoreError> {
        validate_builtin(&*attribute)?;
        instance_schema(std::slice::from_ref(&*attribute))?;

        let key = format!("{}.{}", attribute.object_id(), attribute.property_id());
        self.require_model(EntityKind::Attribute, attribute.object_id(), &key)?;
        if !attribute.group_id().is_empty()
            && self
                .group(attribute.object_id(), attribute.group_id())?
                .is_none()
        {
            return Err(StoreError::integrity(
                EntityKind::Attribute,
                &key,
                format!(
                    "group '{}' of model '{}'",
                    attribute.group_id(),
                    attribute.object_id()
                ),
            ));
        }
        self.ensure_unique(
            &*attribute,
            Filter::new()
                .eq(OBJ_ID_KEY, attribute.object_id())
                .eq(PROPERTY_KEY, attribute.property_id()),
            &key,
        )?;
        self.persist(attribute, &key)
    }

    /// Save an instance after validating it against its model's schema.
    ///
    /// # Errors
    ///
    /// - `StoreError::Integrity` if the model does not exist
    /// - `CoreError::Validation` for keys the model does not declare and for
    ///   values that violate their field
    /// - `CoreError::DuplicateKey` if a unique attribute's value is taken
    pub fn save_instance(&self, instance: &mut InstanceDef) -> Result<EntityId, StoreError> {
        let obj_id = instance.object_id().to_string();
        self.require_model(EntityKind::Instance, &obj_id, &obj_id)?;

        let attributes = self.attributes(&obj_id)?;
        let schema = instance_schema(&attributes)?;
        check_declared(&schema, instance.record(), &obj_id)?;
        schema.validate(instance.record())?;

        for attr in attributes.iter().filter(|a| a.unique()) {
            let Some(value) = instance.record().value(attr.property_id()) else {
                continue;
            };
            let key = format!("{obj_id}.{}={value}", attr.property_id());
            self.ensure_unique(
                &*instance,
                Filter::new()
                    .eq(OBJ_ID_KEY, obj_id.as_str())
                    .eq(attr.property_id(), value.clone()),
                &key,
            )?;
        }
        self.persist(instance, &obj_id)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Decode a JSON payload into an unsaved instance of `obj_id`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the model does not exist and
    /// `CoreError::Parse` if the payload is malformed.
    pub fn decode_instance(&self, obj_id: &str, payload: &[u8]) -> Result<InstanceDef, StoreError> {
        let schema = self.instance_schema(obj_id)?;
        let record = schema.decode(payload)?;
        Ok(InstanceDef::new(obj_id).with_record(record))
    }

    /// Classification by business key.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query fails.
    pub fn classification(&self, id: &str) -> Result<Option<ClassificationDef>, StoreError> {
        self.find_one(Filter::new().eq(CLASSIFICATION_KEY, id))
    }

    /// Model by object id.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query fails.
    pub fn model(&self, obj_id: &str) -> Result<Option<ModelDef>, StoreError> {
        self.find_one(Filter::new().eq(OBJ_ID_KEY, obj_id))
    }

    /// Group of a model by group id.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query fails.
    pub fn group(&self, obj_id: &str, group_id: &str) -> Result<Option<GroupDef>, StoreError> {
        self.find_one(Filter::new().eq(OBJ_ID_KEY, obj_id).eq(GROUP_KEY, group_id))
    }

    /// All attributes of a model, in store order.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query fails.
    pub fn attributes(&self, obj_id: &str) -> Result<Vec<AttributeDef>, StoreError> {
        Ok(ModelDef::new(obj_id, "")
            .find_attributes(&self.store, &Filter::new())?
            .collect_all()?)
    }

    /// Instance schema of an existing model.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the model does not exist, or
    /// `CoreError::Value` if one of its attributes cannot become a field.
    pub fn instance_schema(&self, obj_id: &str) -> Result<RecordSchema, StoreError> {
        let model = self.model(obj_id)?.ok_or_else(|| CoreError::NotFound {
            entity_type: EntityKind::Model.to_string(),
            id: obj_id.to_string(),
        })?;
        Ok(model.instance_schema(&self.store)?)
    }

    /// Load an entity by identity.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no such record exists.
    pub fn load<T: Entity>(&self, id: EntityId) -> Result<T, StoreError> {
        let record = self.store.load(T::KIND, id)?;
        Ok(T::from_record(id, &record)?)
    }

    /// Delete an entity by identity. Children are left in place.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no such record exists.
    pub fn delete<T: Entity>(&self, id: EntityId) -> Result<(), StoreError> {
        self.store.delete(T::KIND, id)?;
        info!(kind = %T::KIND, %id, "deleted entity");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn find_one<T: Entity>(&self, filter: Filter) -> Result<Option<T>, StoreError> {
        let mut rows = self.store.query(T::KIND, &filter.limit(1))?;
        match rows.next().transpose()? {
            Some((id, record)) => Ok(Some(T::from_record(id, &record)?)),
            None => Ok(None),
        }
    }

    fn require_model(&self, kind: EntityKind, obj_id: &str, key: &str) -> Result<(), StoreError> {
        if self.model(obj_id)?.is_none() {
            return Err(StoreError::integrity(kind, key, format!("model '{obj_id}'")));
        }
        Ok(())
    }

    /// Fail if a record other than `entity` itself matches `filter`.
    fn ensure_unique<T: Entity>(
        &self,
        entity: &T,
        filter: Filter,
        key: &str,
    ) -> Result<(), StoreError> {
        let own = entity.persisted_id();
        for row in self.store.query(T::KIND, &filter)? {
            let (id, _) = row?;
            if Some(id) != own {
                debug!(kind = %T::KIND, key, existing = %id, "duplicate business key");
                return Err(CoreError::DuplicateKey(format!("{} '{key}'", T::KIND)).into());
            }
        }
        Ok(())
    }

    fn persist<T: Entity>(&self, entity: &mut T, key: &str) -> Result<EntityId, StoreError> {
        let id = self.store.save(T::KIND, &entity.to_record())?;
        entity.set_persisted_id(id);
        info!(kind = %T::KIND, %id, key, "saved entity");
        Ok(id)
    }
}

fn validate_builtin<T: Entity>(entity: &T) -> Result<(), StoreError> {
    if let Some(schema) = builtin_schema(T::KIND) {
        schema.validate(&entity.to_record())?;
    }
    Ok(())
}

fn check_declared(schema: &RecordSchema, record: &Record, obj_id: &str) -> Result<(), CoreError> {
    match record.iter().find(|(key, _)| !schema.contains(key)) {
        Some((key, value)) => Err(CoreError::Validation {
            key: key.clone(),
            constraint: format!("is not an attribute of model '{obj_id}'"),
            actual: value.to_string(),
        }),
        None => Ok(()),
    }
}
