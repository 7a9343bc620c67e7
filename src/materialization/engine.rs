//! The describe, build, persist, cache lifecycle.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::dependency_resolver;
use crate::store::{RawRow, StoreAdapter, StoreError, WriteMode};
use crate::table_catalog::{
    validate_rows, ColumnDefinition, Row, TableDescriptor, TableKey, TableRegistry,
};
use crate::type_mapping::{self, STORAGE_TIMESTAMP_FORMAT};

use super::cache::{MaterializationCache, MaterializedTable};
use super::errors::{BatchError, MaterializeError};
use super::TableState;

/// Options for a materialization request.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializeOptions {
    /// Rebuild the requested table even when a cached copy exists.
    /// Dependencies still reuse their cached entries.
    pub force_rebuild: bool,
    /// How the store write treats existing data.
    pub write_mode: WriteMode,
}

/// Outcome of a successful batch, in materialization order.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializationReport {
    /// Resolved order, dependencies first.
    pub order: Vec<TableKey>,
    /// Tables written to the store by this request.
    pub written: Vec<TableKey>,
    /// Cache hits that issued no store call.
    pub reused: Vec<TableKey>,
}

/// Orchestrates descriptors through `NotStarted -> Building -> Persisting ->
/// Cached`, with failures landing in `Failed`.
///
/// Registry and store are injected at construction; the engine holds the one
/// shared mutable resource, the materialization cache. Independent roots may
/// be materialized concurrently through `&self`; requests that share a table
/// serialize on that table's writer lock.
pub struct MaterializationEngine {
    registry: Arc<TableRegistry>,
    store: Arc<dyn StoreAdapter>,
    cache: MaterializationCache,
}

impl MaterializationEngine {
    pub fn new(registry: Arc<TableRegistry>, store: Arc<dyn StoreAdapter>) -> Self {
        Self {
            registry,
            store,
            cache: MaterializationCache::new(),
        }
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub async fn materialize(&self, key: &TableKey) -> Result<MaterializationReport, BatchError> {
        self.materialize_with(key, MaterializeOptions::default())
            .await
    }

    pub async fn materialize_with(
        &self,
        key: &TableKey,
        options: MaterializeOptions,
    ) -> Result<MaterializationReport, BatchError> {
        // Structural failures (cycles, unresolved references) abort here,
        // before any store interaction.
        let order = dependency_resolver::resolve(std::slice::from_ref(key), &self.registry)?;
        let keys: Vec<TableKey> = order.iter().map(|d| d.key()).collect();

        let mut written = Vec::new();
        let mut reused = Vec::new();
        for (index, descriptor) in order.iter().enumerate() {
            let table_key = &keys[index];
            let force = options.force_rebuild && table_key == key;
            match self
                .materialize_one(descriptor.as_ref(), force, options.write_mode)
                .await
            {
                Ok(true) => written.push(table_key.clone()),
                Ok(false) => reused.push(table_key.clone()),
                Err(source) => {
                    let skipped: Vec<TableKey> = keys[index + 1..].to_vec();
                    for skipped_key in &skipped {
                        self.cache.set_state(skipped_key, TableState::Failed).await;
                    }
                    warn!("materialization of {table_key} failed: {source}");
                    return Err(BatchError::Table {
                        succeeded: keys[..index].to_vec(),
                        failed: table_key.clone(),
                        skipped,
                        source,
                    });
                }
            }
        }

        info!(
            "materialized {key}: {} written, {} reused",
            written.len(),
            reused.len()
        );
        Ok(MaterializationReport {
            order: keys,
            written,
            reused,
        })
    }

    /// Lifecycle state of one table as seen by this engine.
    pub async fn state(&self, key: &TableKey) -> TableState {
        self.cache.state(key).await
    }

    /// Rows of an already-cached table, or a fetch from the store for a
    /// table never materialized in-process. The fetch path assumes the table
    /// already exists physically; it never triggers a rebuild and its result
    /// is not cached.
    pub async fn read(&self, key: &TableKey) -> Result<Arc<MaterializedTable>, MaterializeError> {
        if let Some(cached) = self.cache.get(key).await {
            debug!("read of {key} served from cache");
            return Ok(cached);
        }

        let descriptor = self.registry.lookup(key)?;
        let columns = descriptor.column_definitions();
        let raw = self
            .store
            .read_table(key, &columns)
            .await
            .map_err(|source| MaterializeError::Store {
                table: key.clone(),
                source,
            })?;
        let rows = coerce_raw_rows(key, &columns, raw)?;
        Ok(Arc::new(MaterializedTable {
            key: key.clone(),
            columns,
            rows,
            materialized_at: chrono::Utc::now(),
        }))
    }

    /// Export surface: ordered rows plus column metadata, the sole input a
    /// file or spreadsheet exporter needs.
    pub async fn materialized_rows(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Arc<MaterializedTable>, MaterializeError> {
        self.read(&TableKey::new(schema, table)).await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Returns true when the table was written by this call, false on a
    /// cache hit.
    async fn materialize_one(
        &self,
        descriptor: &dyn TableDescriptor,
        force: bool,
        write_mode: WriteMode,
    ) -> Result<bool, MaterializeError> {
        let key = descriptor.key();
        let lock = self.cache.writer_lock(&key).await;
        let _guard = lock.lock().await;

        if !force && self.cache.get(&key).await.is_some() {
            debug!("{key} already cached; skipping store write");
            return Ok(false);
        }

        self.cache.set_state(&key, TableState::Building).await;
        let columns = descriptor.column_definitions();
        let raw_rows = match descriptor.build_rows() {
            Ok(rows) => rows,
            Err(source) => {
                self.cache.set_state(&key, TableState::Failed).await;
                return Err(MaterializeError::RowValidation { table: key, source });
            }
        };
        let rows = match validate_rows(&columns, raw_rows, descriptor.timestamp_format()) {
            Ok(rows) => rows,
            Err(source) => {
                self.cache.set_state(&key, TableState::Failed).await;
                return Err(MaterializeError::RowValidation { table: key, source });
            }
        };

        self.cache.set_state(&key, TableState::Persisting).await;
        if let Err(error) = self
            .persist(descriptor, &key, &columns, &rows, write_mode)
            .await
        {
            self.cache.set_state(&key, TableState::Failed).await;
            return Err(error);
        }

        self.cache
            .insert(MaterializedTable {
                key: key.clone(),
                columns,
                rows,
                materialized_at: chrono::Utc::now(),
            })
            .await;
        self.cache.set_state(&key, TableState::Cached).await;
        Ok(true)
    }

    async fn persist(
        &self,
        descriptor: &dyn TableDescriptor,
        key: &TableKey,
        columns: &[ColumnDefinition],
        rows: &[Row],
        write_mode: WriteMode,
    ) -> Result<(), MaterializeError> {
        let store_error = |source: StoreError| MaterializeError::Store {
            table: key.clone(),
            source,
        };

        self.store
            .create_schema(&key.schema)
            .await
            .map_err(store_error)?;
        self.store
            .write_table(key, columns, descriptor.primary_key(), rows, write_mode)
            .await
            .map_err(store_error)?;

        // Constraints install only after the data is persisted; referenced
        // tables are already Cached by resolver ordering.
        for foreign_key in descriptor.foreign_keys() {
            self.store
                .install_foreign_key(
                    key,
                    &foreign_key.column,
                    &foreign_key.references,
                    &foreign_key.referenced_column,
                )
                .await
                .map_err(|source| match source {
                    StoreError::Constraint { detail } => MaterializeError::ConstraintInstall {
                        table: key.clone(),
                        column: foreign_key.column.clone(),
                        references: foreign_key.references.clone(),
                        referenced_column: foreign_key.referenced_column.clone(),
                        detail,
                    },
                    other => MaterializeError::Store {
                        table: key.clone(),
                        source: other,
                    },
                })?;
        }
        Ok(())
    }
}

fn coerce_raw_rows(
    key: &TableKey,
    columns: &[ColumnDefinition],
    raw: Vec<RawRow>,
) -> Result<Vec<Row>, MaterializeError> {
    let mut rows = Vec::with_capacity(raw.len());
    for (row_index, raw_row) in raw.iter().enumerate() {
        if raw_row.len() != columns.len() {
            return Err(MaterializeError::Store {
                table: key.clone(),
                source: StoreError::Backend {
                    message: format!(
                        "row {row_index} has {} values, expected {}",
                        raw_row.len(),
                        columns.len()
                    ),
                },
            });
        }
        let mut cells = Vec::with_capacity(columns.len());
        for (column, raw_value) in columns.iter().zip(raw_row) {
            let value =
                type_mapping::coerce_json(raw_value, column.semantic_type, STORAGE_TIMESTAMP_FORMAT)
                    .map_err(|source| MaterializeError::RetrievalCoercion {
                        table: key.clone(),
                        row_index,
                        column: column.name.clone(),
                        source,
                    })?;
            cells.push(value);
        }
        rows.push(Row::new(cells));
    }
    Ok(rows)
}
