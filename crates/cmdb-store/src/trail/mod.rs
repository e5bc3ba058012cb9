//! JSONL trail persistence.
//!
//! Every save and delete on a trail-enabled `MemoryStore` is recorded as a
//! `TrailOperation` in `{trail_dir}/{kind}.jsonl`. The store is rebuildable
//! from these files with [`TrailReplayer::rebuild`].
//!
//! The `v` field supports format versioning: lines without a `v` field
//! deserialize with `v == 1`.

pub mod replayer;
pub mod writer;

use cmdb_core::EntityId;
use cmdb_core::enums::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use replayer::{RebuildSummary, TrailReplayer};
pub use writer::TrailWriter;

/// Current trail format version.
pub const TRAIL_VERSION: u32 = 1;

const fn default_trail_version() -> u32 {
    TRAIL_VERSION
}

/// Kind of mutation recorded in the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailOp {
    Create,
    Update,
    Delete,
}

impl TrailOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for TrailOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operation recorded in the JSONL trail.
///
/// `data` holds the full stored record for `Create` and `Update`, and is
/// `null` for `Delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailOperation {
    /// Format version. Defaults to 1 for lines without this field.
    #[serde(default = "default_trail_version")]
    pub v: u32,

    /// Store-wide sequence number; replay order.
    pub seq: u64,

    /// RFC 3339 timestamp of the operation.
    pub ts: String,

    pub op: TrailOp,

    pub kind: EntityKind,

    pub id: EntityId,

    #[serde(default)]
    pub data: serde_json::Value,
}

impl TrailOperation {
    #[must_use]
    pub fn new(
        seq: u64,
        op: TrailOp,
        kind: EntityKind,
        id: EntityId,
        data: serde_json::Value,
    ) -> Self {
        Self {
            v: TRAIL_VERSION,
            seq,
            ts: chrono::Utc::now().to_rfc3339(),
            op,
            kind,
            id,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn trail_op_roundtrip() {
        let op = TrailOperation {
            v: 1,
            seq: 4,
            ts: "2026-02-08T12:00:00+00:00".to_string(),
            op: TrailOp::Create,
            kind: EntityKind::Model,
            id: EntityId(9),
            data: serde_json::json!({"bk_obj_id": "switch"}),
        };

        let json = serde_json::to_string(&op).unwrap();
        let recovered: TrailOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, op);
    }

    #[test]
    fn trail_op_default_version() {
        let json = r#"{"seq":1,"ts":"2026-01-01T00:00:00+00:00","op":"delete","kind":"group","id":3}"#;
        let op: TrailOperation = serde_json::from_str(json).unwrap();
        assert_eq!(op.v, 1);
        assert_eq!(op.op, TrailOp::Delete);
        assert!(op.data.is_null());
    }
}
