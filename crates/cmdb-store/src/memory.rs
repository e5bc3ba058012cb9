//! In-memory `MetaStore` with an optional JSONL trail.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cmdb_config::StoreConfig;
use cmdb_core::enums::EntityKind;
use cmdb_core::metamodel::ID_KEY;
use cmdb_core::{CoreError, EntityId, Filter, MetaStore, Record, RecordIter};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::trail::{TrailOp, TrailOperation, TrailReplayer, TrailWriter};

#[derive(Debug, Default)]
struct Tables {
    /// Last identity handed out, shared by all kinds.
    next_id: u64,
    /// Last trail sequence number.
    seq: u64,
    rows: BTreeMap<EntityKind, BTreeMap<EntityId, Record>>,
}

impl Tables {
    fn get(&self, kind: EntityKind, id: EntityId) -> Option<&Record> {
        self.rows.get(&kind).and_then(|table| table.get(&id))
    }
}

/// Thread-safe in-memory store.
///
/// Records live in per-kind ordered maps behind one `RwLock`. Query results
/// are produced lazily: the scan snapshots matching ids up front and reads
/// each record when the iterator reaches it, so records deleted mid-scan are
/// skipped.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    trail: TrailWriter,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Store without a trail.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Arc::default(),
            trail: TrailWriter::disabled(),
        }
    }

    /// Empty store recording to `trail_dir`. Existing trail files are not
    /// replayed; use [`MemoryStore::open`] or [`TrailReplayer::rebuild`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the directory cannot be created.
    pub fn with_trail_dir(trail_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            tables: Arc::default(),
            trail: TrailWriter::new(trail_dir)?,
        })
    }

    /// Open a store as configured: without a trail, or by replaying the
    /// configured trail directory and continuing to record into it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the trail cannot be read or replayed.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if !config.is_configured() {
            debug!("trail disabled, opening empty store");
            return Ok(Self::new());
        }

        let dir = config.trail_path();
        if !dir.exists() {
            info!(trail_dir = %dir.display(), "creating new trail");
            return Self::with_trail_dir(dir);
        }

        let (store, summary) = TrailReplayer::rebuild(&dir)?;
        info!(
            trail_dir = %dir.display(),
            files = summary.trail_files,
            operations = summary.operations_replayed,
            duration_ms = summary.duration_ms,
            "replayed trail"
        );
        Ok(store)
    }

    #[must_use]
    pub const fn trail(&self) -> &TrailWriter {
        &self.trail
    }

    pub const fn trail_mut(&mut self) -> &mut TrailWriter {
        &mut self.trail
    }

    pub(crate) fn set_trail(&mut self, trail: TrailWriter) {
        self.trail = trail;
    }

    /// Number of stored records of `kind`.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        self.read().rows.get(&kind).map_or(0, BTreeMap::len)
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Replay
    // -----------------------------------------------------------------------

    /// Apply a replayed `Create`/`Update` without recording it again.
    pub(crate) fn apply_put(&self, seq: u64, kind: EntityKind, id: EntityId, record: Record) {
        let mut tables = self.write();
        tables.seq = tables.seq.max(seq);
        tables.next_id = tables.next_id.max(id.get());
        tables
            .rows
            .entry(kind)
            .or_default()
            .insert(id, record.with(ID_KEY, id));
    }

    /// Apply a replayed `Delete`. Returns whether the record existed.
    pub(crate) fn apply_delete(&self, seq: u64, kind: EntityKind, id: EntityId) -> bool {
        let mut tables = self.write();
        tables.seq = tables.seq.max(seq);
        tables
            .rows
            .get_mut(&kind)
            .and_then(|table| table.remove(&id))
            .is_some()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    fn put(&self, kind: EntityKind, record: &Record) -> Result<EntityId, StoreError> {
        let mut tables = self.write();

        let (id, op) = match EntityId::from_record(record) {
            Some(id) if tables.get(kind, id).is_some() => (id, TrailOp::Update),
            Some(id) => (id, TrailOp::Create),
            None => (EntityId(tables.next_id + 1), TrailOp::Create),
        };
        let stored = record.clone().with(ID_KEY, id);
        let seq = tables.seq + 1;

        self.trail
            .append(&TrailOperation::new(seq, op, kind, id, stored.to_json()))?;

        tables.seq = seq;
        tables.next_id = tables.next_id.max(id.get());
        tables.rows.entry(kind).or_default().insert(id, stored);
        debug!(%kind, %id, %op, "stored record");
        Ok(id)
    }

    fn remove(&self, kind: EntityKind, id: EntityId) -> Result<(), StoreError> {
        let mut tables = self.write();
        if tables.get(kind, id).is_none() {
            return Err(not_found(kind, id).into());
        }
        let seq = tables.seq + 1;

        self.trail.append(&TrailOperation::new(
            seq,
            TrailOp::Delete,
            kind,
            id,
            serde_json::Value::Null,
        ))?;

        tables.seq = seq;
        if let Some(table) = tables.rows.get_mut(&kind) {
            table.remove(&id);
        }
        debug!(%kind, %id, "deleted record");
        Ok(())
    }
}

fn not_found(kind: EntityKind, id: EntityId) -> CoreError {
    CoreError::NotFound {
        entity_type: kind.to_string(),
        id: id.to_string(),
    }
}

impl MetaStore for MemoryStore {
    fn save(&self, kind: EntityKind, record: &Record) -> Result<EntityId, CoreError> {
        self.put(kind, record).map_err(CoreError::from)
    }

    fn load(&self, kind: EntityKind, id: EntityId) -> Result<Record, CoreError> {
        self.read()
            .get(kind, id)
            .cloned()
            .ok_or_else(|| not_found(kind, id))
    }

    fn query(&self, kind: EntityKind, filter: &Filter) -> Result<RecordIter, CoreError> {
        let ids: Vec<EntityId> = self
            .read()
            .rows
            .get(&kind)
            .map(|table| table.keys().copied().collect())
            .unwrap_or_default();

        let tables = Arc::clone(&self.tables);
        let filter = filter.clone();
        let limit = filter.max_results().unwrap_or(usize::MAX);

        let rows = ids
            .into_iter()
            .filter_map(move |id| {
                let tables = tables.read().unwrap_or_else(PoisonError::into_inner);
                tables
                    .get(kind, id)
                    .filter(|record| filter.matches(record))
                    .map(|record| Ok::<_, CoreError>((id, record.clone())))
            })
            .take(limit);
        Ok(Box::new(rows))
    }

    fn delete(&self, kind: EntityKind, id: EntityId) -> Result<(), CoreError> {
        self.remove(kind, id).map_err(CoreError::from)
    }
}
