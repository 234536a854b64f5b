use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use quizdesk_core::RecordId;
use quizdesk_schema::{Record, ResourceKind};

use super::r#trait::{Store, StoreError};

#[derive(Debug, Clone)]
struct Row {
    seq: u64,
    record: Record,
}

#[derive(Debug, Default)]
struct Tables {
    next_seq: u64,
    rows: HashMap<ResourceKind, HashMap<RecordId, Row>>,
}

impl Tables {
    fn contains(&self, kind: ResourceKind, id: RecordId) -> bool {
        self.rows.get(&kind).is_some_and(|t| t.contains_key(&id))
    }

    fn ensure_references(&self, record: &Record) -> Result<(), StoreError> {
        for (kind, id) in record.references() {
            if !self.contains(kind, id) {
                return Err(StoreError::integrity(format!(
                    "{} references missing {} {}",
                    record.kind(),
                    kind,
                    id
                )));
            }
        }
        Ok(())
    }

    /// Target plus every record that transitively references it.
    fn cascade_closure(&self, kind: ResourceKind, id: RecordId) -> Vec<(ResourceKind, RecordId)> {
        let mut doomed: Vec<(ResourceKind, RecordId)> = vec![(kind, id)];
        let mut seen: HashSet<(ResourceKind, RecordId)> = doomed.iter().copied().collect();
        let mut cursor = 0;

        while cursor < doomed.len() {
            let (parent_kind, parent_id) = doomed[cursor];
            cursor += 1;

            for row in self.rows.values().flat_map(|t| t.values()) {
                let key = (row.record.kind(), row.record.id());
                if !seen.contains(&key) && row.record.refers_to(parent_kind, parent_id) {
                    seen.insert(key);
                    doomed.push(key);
                }
            }
        }

        doomed
    }
}

/// In-memory record store.
///
/// Intended for tests/dev. Every mutation runs under one write lock, so integrity checks
/// and the write itself are atomic with respect to other requests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Record>, StoreError> {
        let tables = self.read()?;
        let mut rows: Vec<&Row> = tables
            .rows
            .get(&kind)
            .map(|t| t.values().collect())
            .unwrap_or_default();
        rows.sort_by_key(|r| r.seq);
        Ok(rows.into_iter().map(|r| r.record.clone()).collect())
    }

    async fn get(&self, kind: ResourceKind, id: RecordId) -> Result<Option<Record>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .rows
            .get(&kind)
            .and_then(|t| t.get(&id))
            .map(|r| r.record.clone()))
    }

    async fn insert(&self, record: Record) -> Result<Record, StoreError> {
        let mut tables = self.write()?;
        let (kind, id) = (record.kind(), record.id());

        if tables.contains(kind, id) {
            return Err(StoreError::integrity(format!("duplicate {kind} key {id}")));
        }
        tables.ensure_references(&record)?;

        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.rows.entry(kind).or_default().insert(
            id,
            Row {
                seq,
                record: record.clone(),
            },
        );
        tracing::debug!(%kind, %id, "record inserted");
        Ok(record)
    }

    async fn update(&self, record: Record) -> Result<Option<Record>, StoreError> {
        let mut tables = self.write()?;
        let (kind, id) = (record.kind(), record.id());

        if !tables.contains(kind, id) {
            return Ok(None);
        }
        tables.ensure_references(&record)?;

        if let Some(row) = tables.rows.get_mut(&kind).and_then(|t| t.get_mut(&id)) {
            row.record = record.clone();
        }
        tracing::debug!(%kind, %id, "record updated");
        Ok(Some(record))
    }

    async fn delete(&self, kind: ResourceKind, id: RecordId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if !tables.contains(kind, id) {
            return Ok(false);
        }

        let doomed = tables.cascade_closure(kind, id);
        for (k, rid) in &doomed {
            if let Some(t) = tables.rows.get_mut(k) {
                t.remove(rid);
            }
        }
        tracing::debug!(%kind, %id, removed = doomed.len(), "record deleted");
        Ok(true)
    }
}
