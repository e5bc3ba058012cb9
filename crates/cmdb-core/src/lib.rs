//! # cmdb-core
//!
//! The dynamic schema engine behind the CMDB.
//!
//! Object types ("models") are defined as data, not code. This crate provides:
//! - `AttributeValue`: the scalar cell stored in every record, with JSON inference decode
//! - Field definitions and their constraint kinds (numeric, text, bool, time)
//! - `RecordSchema`: compiles field definitions into a reusable layout that decodes,
//!   validates, and encodes `Record`s
//! - The Classification → Model → Group → Attribute → Instance metamodel
//! - The `MetaStore` collaborator trait that persistence layers implement
//!
//! The crate performs no I/O. Every error is returned to the caller as a `CoreError`.

pub mod enums;
pub mod errors;
pub mod field;
pub mod filter;
pub mod metamodel;
pub mod record;
pub mod schema;
pub mod store;
pub mod value;

pub use errors::CoreError;
pub use field::{FieldConstraints, FieldDefinition, FieldDescriptor, FieldSpec, FieldType};
pub use filter::Filter;
pub use metamodel::{Entity, EntityId, EntityIter};
pub use record::Record;
pub use schema::RecordSchema;
pub use store::{MetaStore, RecordIter};
pub use value::{AttributeValue, TIME_LAYOUT, ValueKind};
