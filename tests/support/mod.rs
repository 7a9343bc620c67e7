//! Shared fixtures for the unit and integration suites: a configurable
//! descriptor plus the architects/buildings tables used end to end.

// Not every suite exercises every helper.
#![allow(dead_code)]

use std::sync::Arc;

use tableforge::{
    ColumnDefinition, ForeignKey, Row, RowValidationError, SemanticType, TableDescriptor,
    TableKey, TableRegistry, Value,
};

/// Opt-in log output for debugging test runs (`RUST_LOG=debug cargo test`).
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A descriptor assembled field by field, so tests can declare exactly the
/// table shape they need.
pub struct FixtureTable {
    schema: String,
    name: String,
    columns: Vec<ColumnDefinition>,
    primary_key: Option<String>,
    foreign_keys: Vec<ForeignKey>,
    rows: Vec<Row>,
    ts_format: Option<String>,
    build_failure: Option<RowValidationError>,
}

impl FixtureTable {
    pub fn new(schema: &str, name: &str) -> Self {
        FixtureTable {
            schema: schema.to_string(),
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            rows: Vec::new(),
            ts_format: None,
            build_failure: None,
        }
    }

    pub fn column(mut self, name: &str, semantic_type: SemanticType, description: &str) -> Self {
        self.columns
            .push(ColumnDefinition::new(name, semantic_type, description));
        self
    }

    pub fn primary_key(mut self, name: &str) -> Self {
        self.primary_key = Some(name.to_string());
        self
    }

    pub fn foreign_key(mut self, column: &str, referenced: TableKey, referenced_column: &str) -> Self {
        self.foreign_keys
            .push(ForeignKey::new(column, referenced, referenced_column));
        self
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(Row::new(values));
        self
    }

    pub fn timestamp_format(mut self, format: &str) -> Self {
        self.ts_format = Some(format.to_string());
        self
    }

    pub fn failing_build(mut self, error: RowValidationError) -> Self {
        self.build_failure = Some(error);
        self
    }

    pub fn register(self, registry: &mut TableRegistry) -> TableKey {
        let key = TableKey::new(self.schema.clone(), self.name.clone());
        registry
            .register(Arc::new(self))
            .expect("fixture descriptor is well formed");
        key
    }
}

impl TableDescriptor for FixtureTable {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn schema_name(&self) -> &str {
        &self.schema
    }

    fn column_definitions(&self) -> Vec<ColumnDefinition> {
        self.columns.clone()
    }

    fn primary_key(&self) -> &str {
        self.primary_key
            .as_deref()
            .or_else(|| self.columns.first().map(|c| c.name.as_str()))
            .unwrap_or("")
    }

    fn foreign_keys(&self) -> Vec<ForeignKey> {
        self.foreign_keys.clone()
    }

    fn timestamp_format(&self) -> &str {
        self.ts_format
            .as_deref()
            .unwrap_or(tableforge::type_mapping::STORAGE_TIMESTAMP_FORMAT)
    }

    fn build_rows(&self) -> Result<Vec<Row>, RowValidationError> {
        match &self.build_failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.rows.clone()),
        }
    }
}

/// The no-dependency end of the end-to-end scenario.
pub fn architects() -> FixtureTable {
    let mut table = FixtureTable::new("test", "architects")
        .column("last_name", SemanticType::String, "Architect family name")
        .primary_key("last_name");
    for name in ["Durand", "Blanc", "Dubois", "Martin"] {
        table = table.row(vec![Value::String(name.to_string())]);
    }
    table
}

/// Depends on `architects` through its `architect` column. Dates are raw
/// day/month/year strings, coerced during validation.
pub fn buildings() -> FixtureTable {
    let rows = [
        (11, "Durand", 14.4, "10/03/1957", true),
        (20, "Blanc", 24.4, "30/11/1987", true),
        (14, "Blanc", 35.3, "01/02/1970", false),
        (34, "Dubois", 12.3, "04/01/1989", true),
    ];
    let mut table = FixtureTable::new("test", "buildings")
        .column("building_id", SemanticType::Integer, "Identification number")
        .column("architect", SemanticType::String, "Architect name")
        .column("height", SemanticType::Float, "Height in meters")
        .column("construction_date", SemanticType::Timestamp, "Construction date")
        .column("is_listed", SemanticType::Boolean, "Listed building")
        .primary_key("building_id")
        .foreign_key("architect", TableKey::new("test", "architects"), "last_name")
        .timestamp_format("%d/%m/%Y");
    for (id, architect, height, date, listed) in rows {
        table = table.row(vec![
            Value::Integer(id),
            Value::String(architect.to_string()),
            Value::Float(height),
            Value::String(date.to_string()),
            Value::Boolean(listed),
        ]);
    }
    table
}
