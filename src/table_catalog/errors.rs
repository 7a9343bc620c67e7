use thiserror::Error;

use crate::type_mapping::TypeCoercionError;

use super::TableKey;

/// Declaration-shape violations. These are detected at registration time,
/// before any store interaction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("table `{key}` is already registered")]
    AlreadyRegistered { key: TableKey },
    #[error("table `{key}` declares no columns")]
    EmptyColumnSet { key: TableKey },
    #[error("table `{key}` declares column `{column}` more than once")]
    DuplicateColumn { key: TableKey, column: String },
    #[error("primary key `{column}` of table `{key}` is not a declared column")]
    UnknownPrimaryKey { key: TableKey, column: String },
    #[error("foreign-key column `{column}` of table `{key}` is not a declared column")]
    UnknownForeignKeyColumn { key: TableKey, column: String },
    #[error("no table registered under `{key}`")]
    UnknownTable { key: TableKey },
}

/// A built row does not satisfy the table's column declarations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RowValidationError {
    #[error("row {row_index} has {actual} cells, expected {expected}")]
    Arity {
        row_index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("row {row_index}, column `{column}`: {source}")]
    Cell {
        row_index: usize,
        column: String,
        source: TypeCoercionError,
    },
    #[error("upstream source failed: {message}")]
    Source { message: String },
}
