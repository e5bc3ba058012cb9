//! The persistence collaborator consumed by the metamodel.
//!
//! The core never talks to storage directly. `Create*` helpers on the
//! metamodel return unsaved entities, and `Find*` helpers read through a
//! `MetaStore`. Whether the implementation blocks, retries, or is backed by
//! threads is its own concern.

use crate::enums::EntityKind;
use crate::errors::CoreError;
use crate::filter::Filter;
use crate::metamodel::EntityId;
use crate::record::Record;

/// Lazy sequence of stored records. Ends with `None`; a failed read yields
/// `Some(Err(..))`.
pub type RecordIter = Box<dyn Iterator<Item = Result<(EntityId, Record), CoreError>> + Send>;

/// Storage backend for metamodel entities and instances.
///
/// Collaborator failures are reported as `CoreError::Other`.
pub trait MetaStore: Send + Sync {
    /// Persist `record` and return its identity.
    ///
    /// A record that already carries an `id` value is stored under that
    /// identity, replacing the previous version.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot persist the record.
    fn save(&self, kind: EntityKind, record: &Record) -> Result<EntityId, CoreError>;

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if nothing is stored under `id`.
    fn load(&self, kind: EntityKind, id: EntityId) -> Result<Record, CoreError>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot start the scan.
    fn query(&self, kind: EntityKind, filter: &Filter) -> Result<RecordIter, CoreError>;

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if nothing is stored under `id`.
    fn delete(&self, kind: EntityKind, id: EntityId) -> Result<(), CoreError>;
}
