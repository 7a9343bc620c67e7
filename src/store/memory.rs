//! In-memory store adapter.
//!
//! Backs the test suite (it counts writes, so idempotence is observable) and
//! doubles as a lightweight store for in-process use. Referential checks on
//! foreign-key installation behave like the production adapter's.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::table_catalog::{ColumnDefinition, Row, TableKey};
use crate::type_mapping::{Value, STORAGE_TIMESTAMP_FORMAT};

use super::{RawRow, StoreAdapter, StoreError, WriteMode};

struct StoredTable {
    columns: Vec<ColumnDefinition>,
    rows: Vec<Row>,
}

/// A recorded foreign-key relation.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledForeignKey {
    pub table: TableKey,
    pub column: String,
    pub references: TableKey,
    pub referenced_column: String,
}

#[derive(Default)]
pub struct MemoryStore {
    schemas: RwLock<HashSet<String>>,
    tables: RwLock<HashMap<TableKey, StoredTable>>,
    foreign_keys: RwLock<Vec<InstalledForeignKey>>,
    write_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `write_table` calls observed.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub async fn installed_foreign_keys(&self) -> Vec<InstalledForeignKey> {
        self.foreign_keys.read().await.clone()
    }

    pub async fn row_count(&self, key: &TableKey) -> Option<usize> {
        self.tables.read().await.get(key).map(|t| t.rows.len())
    }
}

#[async_trait]
impl StoreAdapter for MemoryStore {
    async fn create_schema(&self, schema: &str) -> Result<(), StoreError> {
        self.schemas.write().await.insert(schema.to_string());
        Ok(())
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, StoreError> {
        let key = TableKey::new(schema, table);
        Ok(self.tables.read().await.contains_key(&key))
    }

    async fn write_table(
        &self,
        key: &TableKey,
        columns: &[ColumnDefinition],
        _primary_key: &str,
        rows: &[Row],
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        if !self.schemas.read().await.contains(&key.schema) {
            return Err(StoreError::backend(format!(
                "schema `{}` does not exist",
                key.schema
            )));
        }
        self.write_count.fetch_add(1, Ordering::SeqCst);

        let mut tables = self.tables.write().await;
        match mode {
            WriteMode::Replace => {
                tables.insert(
                    key.clone(),
                    StoredTable {
                        columns: columns.to_vec(),
                        rows: rows.to_vec(),
                    },
                );
            }
            WriteMode::Append => {
                let entry = tables.entry(key.clone()).or_insert_with(|| StoredTable {
                    columns: columns.to_vec(),
                    rows: Vec::new(),
                });
                entry.rows.extend_from_slice(rows);
            }
        }
        Ok(())
    }

    async fn read_table(
        &self,
        key: &TableKey,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<RawRow>, StoreError> {
        let tables = self.tables.read().await;
        let stored = tables.get(key).ok_or_else(|| StoreError::MissingTable {
            schema: key.schema.clone(),
            table: key.table.clone(),
        })?;

        let indices: Vec<usize> = columns
            .iter()
            .map(|column| {
                stored
                    .columns
                    .iter()
                    .position(|c| c.name == column.name)
                    .ok_or_else(|| {
                        StoreError::backend(format!(
                            "column `{}` not present in `{key}`",
                            column.name
                        ))
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(stored
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| {
                        row.value(i)
                            .map(value_to_json)
                            .unwrap_or(serde_json::Value::Null)
                    })
                    .collect()
            })
            .collect())
    }

    async fn install_foreign_key(
        &self,
        table: &TableKey,
        column: &str,
        references: &TableKey,
        referenced_column: &str,
    ) -> Result<(), StoreError> {
        let tables = self.tables.read().await;
        let child = tables.get(table).ok_or_else(|| StoreError::MissingTable {
            schema: table.schema.clone(),
            table: table.table.clone(),
        })?;
        let parent = tables
            .get(references)
            .ok_or_else(|| StoreError::MissingTable {
                schema: references.schema.clone(),
                table: references.table.clone(),
            })?;

        let child_index = column_index(child, column, table)?;
        let parent_index = column_index(parent, referenced_column, references)?;

        let parent_values: HashSet<String> = parent
            .rows
            .iter()
            .filter_map(|row| row.value(parent_index).map(ToString::to_string))
            .collect();
        let orphans = child
            .rows
            .iter()
            .filter_map(|row| row.value(child_index).map(ToString::to_string))
            .filter(|value| !parent_values.contains(value))
            .count();
        if orphans > 0 {
            return Err(StoreError::Constraint {
                detail: format!(
                    "{orphans} value(s) in {table}.{column} have no match in \
                     {references}.{referenced_column}"
                ),
            });
        }
        drop(tables);

        self.foreign_keys.write().await.push(InstalledForeignKey {
            table: table.clone(),
            column: column.to_string(),
            references: references.clone(),
            referenced_column: referenced_column.to_string(),
        });
        Ok(())
    }
}

fn column_index(
    stored: &StoredTable,
    column: &str,
    key: &TableKey,
) -> Result<usize, StoreError> {
    stored
        .columns
        .iter()
        .position(|c| c.name == column)
        .ok_or_else(|| StoreError::backend(format!("column `{column}` not present in `{key}`")))
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(v) => serde_json::Value::from(*v),
        Value::Float(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(v) => serde_json::Value::from(v.clone()),
        Value::Timestamp(v) => {
            serde_json::Value::from(v.format(STORAGE_TIMESTAMP_FORMAT).to_string())
        }
        Value::Boolean(v) => serde_json::Value::from(*v),
    }
}
