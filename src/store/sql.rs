//! SQL text generation for the ClickHouse-backed adapter.
//!
//! Pure string builders, unit-tested as such. The adapter executes them;
//! nothing here touches a connection.

use crate::table_catalog::{ColumnDefinition, Row, TableKey};
use crate::type_mapping::{describe, Value, STORAGE_TIMESTAMP_FORMAT};

// CREATE TABLE test.buildings
// (
//     building_id Int64 COMMENT 'Identification number',
//     architect String,
//     construction_date DateTime
// )
// ENGINE = MergeTree()
// PRIMARY KEY (building_id)

pub fn create_database(schema: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {schema}")
}

pub fn drop_table(key: &TableKey) -> String {
    format!("DROP TABLE IF EXISTS {key}")
}

pub fn create_table(key: &TableKey, columns: &[ColumnDefinition], primary_key: &str) -> String {
    let column_clauses: Vec<String> = columns
        .iter()
        .map(|column| {
            let tag = describe(column.semantic_type);
            if column.description.is_empty() {
                format!("{} {}", column.name, tag)
            } else {
                format!(
                    "{} {} COMMENT '{}'",
                    column.name,
                    tag,
                    escape_string(&column.description)
                )
            }
        })
        .collect();
    format!(
        "CREATE TABLE {key} ( {} ) ENGINE = MergeTree() PRIMARY KEY ({primary_key})",
        column_clauses.join(", ")
    )
}

pub fn insert_into(key: &TableKey, columns: &[ColumnDefinition], rows: &[Row]) -> String {
    let column_list = columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let tuples: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.values().iter().map(render_literal).collect();
            format!("({})", cells.join(", "))
        })
        .collect();
    format!(
        "INSERT INTO {key} ({column_list}) VALUES {}",
        tuples.join(", ")
    )
}

pub fn select_all(key: &TableKey, columns: &[ColumnDefinition]) -> String {
    let column_list = columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {column_list} FROM {key}")
}

pub fn table_exists_query(schema: &str, table: &str) -> String {
    format!(
        "SELECT count() AS total FROM system.tables WHERE database = '{}' AND name = '{}'",
        escape_string(schema),
        escape_string(table)
    )
}

/// Referential check: rows of `table.column` with no match in
/// `references.referenced_column`.
pub fn orphan_count_query(
    table: &TableKey,
    column: &str,
    references: &TableKey,
    referenced_column: &str,
) -> String {
    format!(
        "SELECT count() AS total FROM {table} AS child LEFT ANTI JOIN {references} AS parent ON child.{column} = parent.{referenced_column}"
    )
}

pub fn render_literal(value: &Value) -> String {
    match value {
        Value::Integer(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::String(v) => format!("'{}'", escape_string(v)),
        Value::Timestamp(v) => format!("'{}'", v.format(STORAGE_TIMESTAMP_FORMAT)),
        Value::Boolean(v) => v.to_string(),
    }
}

fn escape_string(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}
