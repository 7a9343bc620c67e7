use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;

use super::descriptor::{TableDescriptor, TableKey};
use super::errors::CatalogError;

/// Explicit descriptor registry, injected into the resolver and engine.
///
/// Starts empty, is filled by static registration at startup, and is cleared
/// explicitly or at process exit. Registration validates declaration shape so
/// malformed descriptors never reach the store.
#[derive(Default)]
pub struct TableRegistry {
    tables: HashMap<TableKey, Arc<dyn TableDescriptor>>,
    registration_order: Vec<TableKey>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: Arc<dyn TableDescriptor>) -> Result<(), CatalogError> {
        let key = descriptor.key();
        if self.tables.contains_key(&key) {
            return Err(CatalogError::AlreadyRegistered { key });
        }
        validate_shape(&key, descriptor.as_ref())?;
        debug!("registered table descriptor {key}");
        self.registration_order.push(key.clone());
        self.tables.insert(key, descriptor);
        Ok(())
    }

    pub fn get(&self, key: &TableKey) -> Option<Arc<dyn TableDescriptor>> {
        self.tables.get(key).cloned()
    }

    pub fn lookup(&self, key: &TableKey) -> Result<Arc<dyn TableDescriptor>, CatalogError> {
        self.get(key).ok_or_else(|| CatalogError::UnknownTable {
            key: key.clone(),
        })
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &TableKey> {
        self.registration_order.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
        self.registration_order.clear();
    }
}

fn validate_shape(key: &TableKey, descriptor: &dyn TableDescriptor) -> Result<(), CatalogError> {
    let columns = descriptor.column_definitions();
    if columns.is_empty() {
        return Err(CatalogError::EmptyColumnSet { key: key.clone() });
    }

    let mut seen = HashSet::new();
    for column in &columns {
        if !seen.insert(column.name.clone()) {
            return Err(CatalogError::DuplicateColumn {
                key: key.clone(),
                column: column.name.clone(),
            });
        }
    }

    let primary_key = descriptor.primary_key();
    if !columns.iter().any(|c| c.name == primary_key) {
        return Err(CatalogError::UnknownPrimaryKey {
            key: key.clone(),
            column: primary_key.to_string(),
        });
    }

    for foreign_key in descriptor.foreign_keys() {
        if !columns.iter().any(|c| c.name == foreign_key.column) {
            return Err(CatalogError::UnknownForeignKeyColumn {
                key: key.clone(),
                column: foreign_key.column,
            });
        }
    }

    Ok(())
}
