//! Store adapter boundary.
//!
//! The core consumes a small set of synchronous-looking primitives from the
//! backing relational store; connection and transaction handling stay on the
//! adapter's side of the line. [`ClickHouseStore`](clickhouse::ClickHouseStore)
//! is the production adapter, [`MemoryStore`](memory::MemoryStore) backs
//! tests and lightweight embedding.

pub mod clickhouse;
pub mod memory;
pub mod sql;

pub use clickhouse::ClickHouseStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::table_catalog::{ColumnDefinition, Row, TableKey};

/// Raw wire row: one JSON value per requested column, uncoerced. Retrieval
/// coercion is the core's job, not the adapter's.
pub type RawRow = Vec<serde_json::Value>;

/// How `write_table` treats existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Drop and recreate the table, then insert.
    #[default]
    Replace,
    /// Insert into the existing table, creating it when absent.
    Append,
}

/// Adapter-defined failures, mapped onto the core taxonomy by the engine.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {message}")]
    Backend { message: String },
    #[error("table `{schema}.{table}` does not exist")]
    MissingTable { schema: String, table: String },
    #[error("constraint violated: {detail}")]
    Constraint { detail: String },
}

impl StoreError {
    pub(crate) fn backend(message: impl ToString) -> Self {
        StoreError::Backend {
            message: message.to_string(),
        }
    }
}

/// Primitives the core needs from the backing store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Create the schema when missing; idempotent.
    async fn create_schema(&self, schema: &str) -> Result<(), StoreError>;

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, StoreError>;

    async fn write_table(
        &self,
        key: &TableKey,
        columns: &[ColumnDefinition],
        primary_key: &str,
        rows: &[Row],
        mode: WriteMode,
    ) -> Result<(), StoreError>;

    async fn read_table(
        &self,
        key: &TableKey,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<RawRow>, StoreError>;

    /// Install a declared foreign-key relation. Fails with
    /// [`StoreError::Constraint`] when the referenced values are missing.
    async fn install_foreign_key(
        &self,
        table: &TableKey,
        column: &str,
        references: &TableKey,
        referenced_column: &str,
    ) -> Result<(), StoreError>;
}
