//! Foreign-key dependency resolution.
//!
//! Expands the transitive foreign-key closure of the requested tables and
//! produces a reverse-topological materialization order: every referenced
//! table strictly precedes its dependents, leaves first. The resolver reasons
//! over declared metadata only; it never queries the store.

pub mod errors;

pub use errors::ResolveError;

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::table_catalog::{TableDescriptor, TableKey, TableRegistry};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

/// Resolve the materialization order for `roots` against `registry`.
///
/// Depth-first with tri-state marking; revisiting an in-progress table is a
/// cycle and fails rather than being silently broken. Ties between tables
/// with no mutual dependency keep first-discovery order (foreign keys in
/// declaration order, roots in request order), so resolution is reproducible
/// across runs.
pub fn resolve(
    roots: &[TableKey],
    registry: &TableRegistry,
) -> Result<Vec<Arc<dyn TableDescriptor>>, ResolveError> {
    let mut marks: HashMap<TableKey, Mark> = HashMap::new();
    let mut trail: Vec<TableKey> = Vec::new();
    let mut order: Vec<Arc<dyn TableDescriptor>> = Vec::new();

    for root in roots {
        let descriptor = registry
            .get(root)
            .ok_or_else(|| ResolveError::UnknownRoot { key: root.clone() })?;
        visit(descriptor, registry, &mut marks, &mut trail, &mut order)?;
    }

    debug!(
        "resolved materialization order: [{}]",
        order
            .iter()
            .map(|d| d.key().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(order)
}

fn visit(
    descriptor: Arc<dyn TableDescriptor>,
    registry: &TableRegistry,
    marks: &mut HashMap<TableKey, Mark>,
    trail: &mut Vec<TableKey>,
    order: &mut Vec<Arc<dyn TableDescriptor>>,
) -> Result<(), ResolveError> {
    let key = descriptor.key();
    match marks.get(&key) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            let first = trail.iter().position(|k| k == &key).unwrap_or(0);
            return Err(ResolveError::CyclicDependency {
                participants: trail[first..].to_vec(),
            });
        }
        None => {}
    }

    marks.insert(key.clone(), Mark::InProgress);
    trail.push(key.clone());

    for foreign_key in descriptor.foreign_keys() {
        let referenced = registry.get(&foreign_key.references).ok_or_else(|| {
            ResolveError::UnresolvedReference {
                from: key.clone(),
                to: foreign_key.references.clone(),
            }
        })?;
        visit(referenced, registry, marks, trail, order)?;
    }

    trail.pop();
    marks.insert(key, Mark::Done);
    order.push(descriptor);
    Ok(())
}
