use thiserror::Error;

use crate::table_catalog::TableKey;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    /// A foreign-key walk revisited a table still being expanded. The
    /// participants are listed in traversal order; a self-referencing table
    /// shows up as a single participant.
    #[error("cyclic foreign-key dependency: {}", join_keys(.participants))]
    CyclicDependency { participants: Vec<TableKey> },
    #[error("foreign key of `{from}` references unregistered table `{to}`")]
    UnresolvedReference { from: TableKey, to: TableKey },
    #[error("requested table `{key}` is not registered")]
    UnknownRoot { key: TableKey },
}

fn join_keys(keys: &[TableKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
