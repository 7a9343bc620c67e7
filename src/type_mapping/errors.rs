use thiserror::Error;

use super::SemanticType;

/// A raw value could not be losslessly converted to its declared type.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("cannot coerce `{raw}` to {target}: {reason}")]
pub struct TypeCoercionError {
    pub raw: String,
    pub target: SemanticType,
    pub reason: String,
}

impl TypeCoercionError {
    pub fn new(
        raw: impl ToString,
        target: SemanticType,
        reason: impl Into<String>,
    ) -> Self {
        TypeCoercionError {
            raw: raw.to_string(),
            target,
            reason: reason.into(),
        }
    }
}

/// An unregistered storage type tag was supplied. This is an implementation
/// bug in the caller, not a runtime data condition.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown storage type tag `{tag}`")]
pub struct UnknownTypeError {
    pub tag: String,
}
