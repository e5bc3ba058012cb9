//! Rebuild a `MemoryStore` from trail files.

use std::path::Path;

use cmdb_core::RecordSchema;
use cmdb_core::enums::EntityKind;
use cmdb_core::metamodel::{InstanceDef, Model, ModelDef, OBJ_ID_KEY, builtin_schema};
use tracing::{debug, warn};

use super::{TRAIL_VERSION, TrailOp, TrailOperation, TrailWriter};
use crate::error::StoreError;
use crate::memory::MemoryStore;

/// Outcome of a trail rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildSummary {
    pub trail_files: u32,
    pub operations_replayed: u32,
    pub entities_created: u32,
    pub entities_deleted: u32,
    pub duration_ms: u64,
}

pub struct TrailReplayer;

impl TrailReplayer {
    /// Replay every `*.jsonl` file in `trail_dir`, in sequence order, into a
    /// fresh store that keeps recording to the same directory.
    ///
    /// Each record is decoded against its kind's schema. Instance schemas are
    /// derived from the attributes replayed before them.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a file cannot be read, an operation has an
    /// unsupported version, or a record no longer decodes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn rebuild(trail_dir: &Path) -> Result<(MemoryStore, RebuildSummary), StoreError> {
        let start = std::time::Instant::now();

        let mut trail_files = 0u32;
        let mut all_ops: Vec<TrailOperation> = Vec::new();

        let entries = std::fs::read_dir(trail_dir).map_err(|e| StoreError::Other(e.into()))?;

        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Other(e.into()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            trail_files += 1;

            let ops: Vec<TrailOperation> = serde_jsonlines::json_lines(&path)
                .map_err(|e| StoreError::Other(e.into()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::Other(e.into()))?;
            all_ops.extend(ops);
        }

        all_ops.sort_by_key(|op| op.seq);

        let store = MemoryStore::new();
        let mut summary = RebuildSummary {
            trail_files,
            ..RebuildSummary::default()
        };

        for op in &all_ops {
            if op.v != TRAIL_VERSION {
                return Err(StoreError::InvalidState(format!(
                    "Unsupported trail version {} for {} {}",
                    op.v, op.kind, op.id
                )));
            }

            replay_operation(&store, op)?;
            summary.operations_replayed += 1;
            match op.op {
                TrailOp::Create => summary.entities_created += 1,
                TrailOp::Delete => summary.entities_deleted += 1,
                TrailOp::Update => {}
            }
        }

        let mut store = store;
        store.set_trail(TrailWriter::new(trail_dir)?);

        summary.duration_ms = start.elapsed().as_millis() as u64;
        Ok((store, summary))
    }
}

fn replay_operation(store: &MemoryStore, op: &TrailOperation) -> Result<(), StoreError> {
    match op.op {
        TrailOp::Delete => {
            if !store.apply_delete(op.seq, op.kind, op.id) {
                warn!(
                    kind = %op.kind,
                    id = %op.id,
                    "trail deletes a record that was never created"
                );
            }
        }
        TrailOp::Create | TrailOp::Update => {
            let schema = schema_for(store, op)?;
            let record = schema.decode_value(&op.data)?;
            debug!(kind = %op.kind, id = %op.id, op = %op.op, "replaying record");
            store.apply_put(op.seq, op.kind, op.id, record);
        }
    }
    Ok(())
}

/// Storage schema for the record carried by `op`.
fn schema_for(store: &MemoryStore, op: &TrailOperation) -> Result<RecordSchema, StoreError> {
    if let Some(schema) = builtin_schema(op.kind) {
        return Ok(schema.clone());
    }
    debug_assert_eq!(op.kind, EntityKind::Instance);

    let obj_id = op
        .data
        .get(OBJ_ID_KEY)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            StoreError::InvalidState(format!("instance {} has no '{OBJ_ID_KEY}'", op.id))
        })?;
    let attributes = ModelDef::new(obj_id, "").instance_schema(store)?;
    Ok(InstanceDef::storage_schema(&attributes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdb_core::{EntityId, MetaStore, Record};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn write(dir: &Path, ops: &[TrailOperation]) {
        let writer = TrailWriter::new(dir).unwrap();
        for op in ops {
            writer.append(op).unwrap();
        }
    }

    #[test]
    fn rebuild_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (store, summary) = TrailReplayer::rebuild(dir.path()).unwrap();
        assert_eq!(summary.trail_files, 0);
        assert_eq!(summary.operations_replayed, 0);
        assert!(store.trail().is_enabled());
    }

    #[test]
    fn rebuild_replays_across_files_in_sequence_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            &[
                TrailOperation::new(
                    1,
                    TrailOp::Create,
                    EntityKind::Classification,
                    EntityId(1),
                    json!({"id": 1, "bk_classification_id": "net"}),
                ),
                TrailOperation::new(
                    2,
                    TrailOp::Create,
                    EntityKind::Model,
                    EntityId(2),
                    json!({"id": 2, "bk_obj_id": "switch", "bk_classification_id": "net"}),
                ),
                TrailOperation::new(
                    3,
                    TrailOp::Update,
                    EntityKind::Model,
                    EntityId(2),
                    json!({
                        "id": 2,
                        "bk_obj_id": "switch",
                        "bk_obj_name": "Switch",
                        "bk_classification_id": "net",
                    }),
                ),
                TrailOperation::new(
                    4,
                    TrailOp::Delete,
                    EntityKind::Classification,
                    EntityId(1),
                    serde_json::Value::Null,
                ),
            ],
        );

        let (store, summary) = TrailReplayer::rebuild(dir.path()).unwrap();
        assert_eq!(summary.trail_files, 2);
        assert_eq!(summary.operations_replayed, 4);
        assert_eq!(summary.entities_created, 2);
        assert_eq!(summary.entities_deleted, 1);

        assert_eq!(store.count(EntityKind::Classification), 0);
        let model = store.load(EntityKind::Model, EntityId(2)).unwrap();
        assert_eq!(model.get("bk_obj_name").unwrap().as_str(), "Switch");

        // Identities continue after the highest replayed one.
        let next = store
            .save(EntityKind::Group, &Record::new().with("bk_group_id", "g"))
            .unwrap();
        assert_eq!(next, EntityId(3));
    }

    #[test]
    fn instance_text_keys_stay_text() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            &[
                TrailOperation::new(
                    1,
                    TrailOp::Create,
                    EntityKind::Attribute,
                    EntityId(1),
                    json!({
                        "id": 1,
                        "bk_obj_id": "switch",
                        "bk_property_id": "serial",
                        "bk_property_type": "singlechar",
                    }),
                ),
                TrailOperation::new(
                    2,
                    TrailOp::Create,
                    EntityKind::Instance,
                    EntityId(2),
                    json!({"id": 2, "bk_obj_id": "switch", "serial": "0042"}),
                ),
            ],
        );

        let (store, _) = TrailReplayer::rebuild(dir.path()).unwrap();
        let instance = store.load(EntityKind::Instance, EntityId(2)).unwrap();
        assert_eq!(instance.get("serial").unwrap().as_str(), "0042");
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut op = TrailOperation::new(
            1,
            TrailOp::Create,
            EntityKind::Classification,
            EntityId(1),
            json!({"id": 1, "bk_classification_id": "net"}),
        );
        op.v = 2;
        write(dir.path(), &[op]);

        assert!(matches!(
            TrailReplayer::rebuild(dir.path()),
            Err(StoreError::InvalidState(_))
        ));
    }

    #[test]
    fn non_jsonl_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a trail").unwrap();
        let (_, summary) = TrailReplayer::rebuild(dir.path()).unwrap();
        assert_eq!(summary.trail_files, 0);
    }
}
