//! JSONL trail writer.
//!
//! Appends `TrailOperation` records to per-kind `{trail_dir}/{kind}.jsonl`
//! files. Uses `serde_jsonlines::append_json_lines` for per-line appends.

use std::path::{Path, PathBuf};

use super::TrailOperation;
use crate::error::StoreError;

/// Appends trail operations to per-kind JSONL files.
///
/// `MemoryStore` calls `append()` before applying a mutation, so a mutation
/// that could not be recorded is never applied.
#[derive(Debug)]
pub struct TrailWriter {
    trail_dir: PathBuf,
    enabled: bool,
}

impl TrailWriter {
    /// Create a writer for `trail_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the directory cannot be created.
    pub fn new(trail_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let trail_dir = trail_dir.into();
        std::fs::create_dir_all(&trail_dir).map_err(|e| StoreError::Other(e.into()))?;
        Ok(Self {
            trail_dir,
            enabled: true,
        })
    }

    /// Create a disabled writer (for tests or when no trail is configured).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            trail_dir: PathBuf::new(),
            enabled: false,
        }
    }

    /// Disabled during rebuild so replayed operations are not written twice.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append an operation to `{trail_dir}/{op.kind}.jsonl`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file write fails.
    pub fn append(&self, op: &TrailOperation) -> Result<(), StoreError> {
        if !self.enabled {
            return Ok(());
        }

        let path = self.file_for(op);
        serde_jsonlines::append_json_lines(&path, [op]).map_err(|e| StoreError::Other(e.into()))?;
        Ok(())
    }

    #[must_use]
    pub fn trail_dir(&self) -> &Path {
        &self.trail_dir
    }

    fn file_for(&self, op: &TrailOperation) -> PathBuf {
        self.trail_dir.join(format!("{}.jsonl", op.kind))
    }
}
