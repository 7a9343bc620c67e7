//! ClickHouse-backed store adapter.
//!
//! Schemas map to ClickHouse databases and DDL/DML run as generated SQL
//! (see [`super::sql`]). ClickHouse does not enforce foreign keys natively,
//! so installation is a referential check plus a record appended to the
//! `foreign_key_catalog` metadata table.

use async_trait::async_trait;
use clickhouse::Client;
use log::{debug, info};
use serde::Serialize;
use tokio::io::AsyncBufReadExt;

use crate::config::StoreConfig;
use crate::table_catalog::{ColumnDefinition, Row, TableKey};

use super::{sql, RawRow, StoreAdapter, StoreError, WriteMode};

const FOREIGN_KEY_CATALOG_DDL: &str = "\
CREATE TABLE IF NOT EXISTS foreign_key_catalog (
    child_table String,
    child_column String,
    parent_table String,
    parent_column String
) ENGINE = ReplacingMergeTree()
ORDER BY (child_table, child_column)";

#[derive(Debug, Serialize, clickhouse::Row)]
struct ForeignKeyRecord {
    child_table: String,
    child_column: String,
    parent_table: String,
    parent_column: String,
}

pub struct ClickHouseStore {
    client: Client,
}

impl ClickHouseStore {
    /// Build a store from connection settings. The settings are an opaque
    /// handle; nothing beyond client construction reads them.
    pub fn new(config: &StoreConfig) -> Self {
        let client = Client::default()
            .with_url(&config.url)
            .with_user(&config.user)
            .with_password(&config.password)
            .with_database(&config.database);
        Self { client }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn execute(&self, query: &str) -> Result<(), StoreError> {
        debug!("executing: {query}");
        self.client
            .clone()
            .with_option("wait_end_of_query", "1")
            .query(query)
            .execute()
            .await
            .map_err(StoreError::backend)
    }

    async fn count(&self, query: &str) -> Result<u64, StoreError> {
        #[derive(Debug, serde::Deserialize, clickhouse::Row)]
        struct CountRow {
            total: u64,
        }

        let row = self
            .client
            .query(query)
            .fetch_one::<CountRow>()
            .await
            .map_err(StoreError::backend)?;
        Ok(row.total)
    }
}

#[async_trait]
impl StoreAdapter for ClickHouseStore {
    async fn create_schema(&self, schema: &str) -> Result<(), StoreError> {
        self.execute(&sql::create_database(schema)).await
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, StoreError> {
        let total = self.count(&sql::table_exists_query(schema, table)).await?;
        Ok(total > 0)
    }

    async fn write_table(
        &self,
        key: &TableKey,
        columns: &[ColumnDefinition],
        primary_key: &str,
        rows: &[Row],
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        match mode {
            WriteMode::Replace => {
                self.execute(&sql::drop_table(key)).await?;
                self.execute(&sql::create_table(key, columns, primary_key))
                    .await?;
            }
            WriteMode::Append => {
                if !self.table_exists(&key.schema, &key.table).await? {
                    self.execute(&sql::create_table(key, columns, primary_key))
                        .await?;
                }
            }
        }
        if !rows.is_empty() {
            self.execute(&sql::insert_into(key, columns, rows)).await?;
        }
        info!("[write_table] {key} ({} rows)", rows.len());
        Ok(())
    }

    async fn read_table(
        &self,
        key: &TableKey,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<RawRow>, StoreError> {
        if !self.table_exists(&key.schema, &key.table).await? {
            return Err(StoreError::MissingTable {
                schema: key.schema.clone(),
                table: key.table.clone(),
            });
        }

        let query = sql::select_all(key, columns);
        let mut lines = self
            .client
            .clone()
            .query(&query)
            .fetch_bytes("JSONEachRow")
            .map_err(StoreError::backend)?
            .lines();

        let mut rows: Vec<RawRow> = Vec::new();
        while let Some(line) = lines.next_line().await.map_err(StoreError::backend)? {
            if line.is_empty() {
                continue;
            }
            let object: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&line)
                    .map_err(|e| StoreError::backend(format!("malformed row: {e}")))?;
            let row = columns
                .iter()
                .map(|column| {
                    object
                        .get(&column.name)
                        .cloned()
                        .unwrap_or(serde_json::Value::Null)
                })
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }

    async fn install_foreign_key(
        &self,
        table: &TableKey,
        column: &str,
        references: &TableKey,
        referenced_column: &str,
    ) -> Result<(), StoreError> {
        let orphans = self
            .count(&sql::orphan_count_query(
                table,
                column,
                references,
                referenced_column,
            ))
            .await?;
        if orphans > 0 {
            return Err(StoreError::Constraint {
                detail: format!(
                    "{orphans} value(s) in {table}.{column} have no match in \
                     {references}.{referenced_column}"
                ),
            });
        }

        self.execute(FOREIGN_KEY_CATALOG_DDL).await?;
        let record = ForeignKeyRecord {
            child_table: table.to_string(),
            child_column: column.to_string(),
            parent_table: references.to_string(),
            parent_column: referenced_column.to_string(),
        };
        let mut insert = self
            .client
            .insert("foreign_key_catalog")
            .map_err(StoreError::backend)?;
        insert.write(&record).await.map_err(StoreError::backend)?;
        insert.end().await.map_err(StoreError::backend)?;
        info!(
            "installed foreign key {table}.{column} -> {references}.{referenced_column}"
        );
        Ok(())
    }
}
