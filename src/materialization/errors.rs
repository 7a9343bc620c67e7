use thiserror::Error;

use crate::dependency_resolver::ResolveError;
use crate::store::StoreError;
use crate::table_catalog::{CatalogError, RowValidationError, TableKey};
use crate::type_mapping::TypeCoercionError;

/// Failure of a single table's materialization or read.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("row validation failed for `{table}`: {source}")]
    RowValidation {
        table: TableKey,
        source: RowValidationError,
    },
    #[error(
        "foreign-key installation failed for `{table}.{column}` -> \
         `{references}.{referenced_column}`: {detail}"
    )]
    ConstraintInstall {
        table: TableKey,
        column: String,
        references: TableKey,
        referenced_column: String,
        detail: String,
    },
    #[error("store operation failed for `{table}`: {source}")]
    Store {
        table: TableKey,
        source: StoreError,
    },
    #[error("retrieved row {row_index}, column `{column}` of `{table}` failed coercion: {source}")]
    RetrievalCoercion {
        table: TableKey,
        row_index: usize,
        column: String,
        source: TypeCoercionError,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Failure of a batch materialization request.
///
/// Always reports which tables were already persisted, which one failed and
/// why, and which dependents were never attempted. Cached tables stay
/// persisted; there is no implicit cross-table rollback.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Structural failure detected before any store interaction.
    #[error("materialization aborted before any write: {source}")]
    Structural {
        #[from]
        source: ResolveError,
    },
    /// One table failed mid-batch.
    #[error("materialization of `{failed}` failed: {source}")]
    Table {
        /// Tables that reached `Cached` before the failure, in order.
        succeeded: Vec<TableKey>,
        failed: TableKey,
        /// Dependents never attempted because their prerequisite failed.
        skipped: Vec<TableKey>,
        source: MaterializeError,
    },
}
