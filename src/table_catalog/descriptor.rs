//! The table-definition contract.
//!
//! A [`TableDescriptor`] declares a logical table once: identity, typed
//! columns, primary key and foreign-key edges. Concrete tables implement the
//! trait and are registered in a [`TableRegistry`](super::TableRegistry);
//! the resolver and engine only ever see the trait.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::type_mapping::{self, Value, STORAGE_TIMESTAMP_FORMAT};

use super::column::ColumnDefinition;
use super::errors::RowValidationError;

/// Identity of a logical table: schema plus table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableKey {
    pub schema: String,
    pub table: String,
}

impl TableKey {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        TableKey {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// A declared foreign-key edge: a local column referencing a column of
/// another registered table. The referenced table is named by key, never by
/// reference, so descriptors stay independent values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub references: TableKey,
    pub referenced_column: String,
}

impl ForeignKey {
    pub fn new(
        column: impl Into<String>,
        references: TableKey,
        referenced_column: impl Into<String>,
    ) -> Self {
        ForeignKey {
            column: column.into(),
            references,
            referenced_column: referenced_column.into(),
        }
    }
}

/// An ordered row of cell values, one per declared column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Declarative contract of one logical table.
///
/// `build_rows` is the only place raw data is produced or fetched; it must
/// not write to the store. Persistence belongs to the materialization engine,
/// which keeps structural checks runnable without touching the store.
pub trait TableDescriptor: Send + Sync {
    fn table_name(&self) -> &str;

    fn schema_name(&self) -> &str;

    fn column_definitions(&self) -> Vec<ColumnDefinition>;

    /// Primary key column; must be one of the declared columns.
    fn primary_key(&self) -> &str;

    /// Produce the raw rows for this table. Cells may still be raw strings
    /// (a date column fed from CSV, say); [`validate_rows`] coerces them
    /// against the declared columns before anything is persisted.
    fn build_rows(&self) -> Result<Vec<Row>, RowValidationError>;

    /// Foreign-key edges, empty by default.
    fn foreign_keys(&self) -> Vec<ForeignKey> {
        Vec::new()
    }

    /// Format used to coerce raw string cells of Timestamp columns.
    fn timestamp_format(&self) -> &str {
        STORAGE_TIMESTAMP_FORMAT
    }

    fn key(&self) -> TableKey {
        TableKey::new(self.schema_name(), self.table_name())
    }
}

impl fmt::Debug for dyn TableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableDescriptor({})", self.key())
    }
}

/// Coerce every cell of `rows` against the declared `columns`.
///
/// Fails with [`RowValidationError`] naming the offending row index and
/// column. Public so descriptor authors can pre-validate inside
/// `build_rows`; the engine applies it regardless.
pub fn validate_rows(
    columns: &[ColumnDefinition],
    rows: Vec<Row>,
    ts_format: &str,
) -> Result<Vec<Row>, RowValidationError> {
    let mut validated = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.into_iter().enumerate() {
        if row.len() != columns.len() {
            return Err(RowValidationError::Arity {
                row_index,
                expected: columns.len(),
                actual: row.len(),
            });
        }
        let mut cells = Vec::with_capacity(columns.len());
        for (column, raw) in columns.iter().zip(row.into_values()) {
            let typed = type_mapping::coerce(&raw, column.semantic_type, ts_format).map_err(
                |source| RowValidationError::Cell {
                    row_index,
                    column: column.name.clone(),
                    source,
                },
            )?;
            cells.push(typed);
        }
        validated.push(Row::new(cells));
    }
    Ok(validated)
}
