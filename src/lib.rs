//! Tableforge - declarative table materialization over a relational store
//!
//! This crate turns a set of independently declared table descriptors into a
//! correctly ordered, type-safe sequence of create/read/write operations:
//! - Table descriptors declare identity, typed columns, keys and foreign-key edges
//! - A dependency resolver derives a reverse-topological build order
//! - A materialization engine runs build, persist, constrain and cache per table
//! - Store adapters (ClickHouse, in-memory) provide the persistence primitives

pub mod config;
pub mod dependency_resolver;
pub mod materialization;
pub mod store;
pub mod table_catalog;
pub mod type_mapping;

// Re-export the surface most callers need.
pub use config::{ConfigError, StoreConfig};
pub use dependency_resolver::{resolve, ResolveError};
pub use materialization::{
    BatchError, MaterializationEngine, MaterializationReport, MaterializeError,
    MaterializeOptions, MaterializedTable, TableState,
};
pub use store::{
    ClickHouseStore, MemoryStore, RawRow, StoreAdapter, StoreError, WriteMode,
};
pub use table_catalog::{
    validate_rows, CatalogError, ColumnDefinition, ForeignKey, Row, RowValidationError,
    TableDescriptor, TableKey, TableRegistry,
};
pub use type_mapping::{SemanticType, TypeCoercionError, UnknownTypeError, Value};
