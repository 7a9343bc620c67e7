//! Process-wide cache of materialized tables.
//!
//! The cache exclusively owns entries; callers receive `Arc` read-only
//! views. Entry replacement is atomic per key, and a per-key writer lock
//! keeps the transition into `Cached` mutually exclusive.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::table_catalog::{ColumnDefinition, Row, TableKey};

use super::TableState;

/// A materialized table: validated rows plus the metadata they were built
/// against, stamped at materialization time.
#[derive(Debug, Clone)]
pub struct MaterializedTable {
    pub key: TableKey,
    pub columns: Vec<ColumnDefinition>,
    pub rows: Vec<Row>,
    pub materialized_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MaterializationCache {
    entries: RwLock<HashMap<TableKey, Arc<MaterializedTable>>>,
    states: Mutex<HashMap<TableKey, TableState>>,
    writer_locks: Mutex<HashMap<TableKey, Arc<Mutex<()>>>>,
}

impl MaterializationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &TableKey) -> Option<Arc<MaterializedTable>> {
        self.entries.read().await.get(key).cloned()
    }

    /// Insert or atomically replace the entry for the table's key.
    pub async fn insert(&self, table: MaterializedTable) -> Arc<MaterializedTable> {
        let entry = Arc::new(table);
        self.entries
            .write()
            .await
            .insert(entry.key.clone(), entry.clone());
        entry
    }

    pub async fn state(&self, key: &TableKey) -> TableState {
        self.states
            .lock()
            .await
            .get(key)
            .copied()
            .unwrap_or(TableState::NotStarted)
    }

    pub(crate) async fn set_state(&self, key: &TableKey, state: TableState) {
        self.states.lock().await.insert(key.clone(), state);
    }

    /// Per-key writer lock: at most one materialization writes a given table
    /// at a time.
    pub(crate) async fn writer_lock(&self, key: &TableKey) -> Arc<Mutex<()>> {
        self.writer_locks
            .lock()
            .await
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Explicit teardown: drop all entries and lifecycle states.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.states.lock().await.clear();
    }
}
