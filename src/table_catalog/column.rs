use serde::{Deserialize, Serialize};

use crate::type_mapping::SemanticType;

/// A single typed column declaration. The description is carried into the
/// store as a column comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub semantic_type: SemanticType,
    pub description: String,
}

impl ColumnDefinition {
    pub fn new(
        name: impl Into<String>,
        semantic_type: SemanticType,
        description: impl Into<String>,
    ) -> Self {
        ColumnDefinition {
            name: name.into(),
            semantic_type,
            description: description.into(),
        }
    }
}
