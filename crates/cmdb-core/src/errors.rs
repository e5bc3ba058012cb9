//! Error taxonomy for the CMDB core.
//!
//! Construction and validation errors are always returned to the immediate
//! caller. Mapping them onto transport outcomes (HTTP status codes and the
//! like) is the caller's job.

use thiserror::Error;

/// Errors raised by values, schemas, records, and the metamodel.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Nil or unsupported input to `AttributeValue` construction.
    #[error("Invalid value: {0}")]
    Value(String),

    /// Two field definitions (or two entities) share the same key.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Record field, entity, or collaborator lookup returned no result.
    #[error("Not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A field value violated its schema constraint.
    #[error("Validation failed for field '{key}': {constraint} (actual: {actual})")]
    Validation {
        key: String,
        constraint: String,
        actual: String,
    },

    /// Malformed JSON, time string, or constraint pattern.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Failure inside a persistence collaborator.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub(crate) fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Field key carried by a `Validation` error.
    #[must_use]
    pub fn field_key(&self) -> Option<&str> {
        match self {
            Self::Validation { key, .. } => Some(key),
            _ => None,
        }
    }
}
