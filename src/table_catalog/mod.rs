pub mod column;
pub mod descriptor;
pub mod errors;
pub mod registry;

// Re-export commonly used types
pub use column::ColumnDefinition;
pub use descriptor::{validate_rows, ForeignKey, Row, TableDescriptor, TableKey};
pub use errors::{CatalogError, RowValidationError};
pub use registry::TableRegistry;
