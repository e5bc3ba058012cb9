//! Error types for cmdb-store.

use cmdb_core::CoreError;
use cmdb_core::enums::EntityKind;
use thiserror::Error;

/// Errors from store, trail, and catalog operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Value, schema, or lookup error from the core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An entity references a parent that does not exist.
    #[error("Integrity violation: {kind} '{key}' references missing {missing}")]
    Integrity {
        kind: EntityKind,
        key: String,
        missing: String,
    },

    /// Invalid state encountered (e.g., unreadable trail entry).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Catch-all for I/O and serialization failures.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub(crate) fn integrity(kind: EntityKind, key: &str, missing: impl Into<String>) -> Self {
        Self::Integrity {
            kind,
            key: key.to_string(),
            missing: missing.into(),
        }
    }
}

/// `MetaStore` reports collaborator failures through `CoreError::Other`.
impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Core(core) => core,
            other => Self::Other(anyhow::Error::new(other)),
        }
    }
}
