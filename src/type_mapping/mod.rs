//! Semantic column types and their storage coercion rules.
//!
//! The five semantic types form a closed set; every dispatch over them is an
//! exhaustive `match` so adding a sixth type is a compile error everywhere it
//! matters. `describe` maps a semantic type to the storage-native tag used in
//! DDL; `coerce` and `coerce_json` convert raw cell values on ingest and
//! retrieval, rejecting anything lossy.

pub mod errors;

pub use errors::{TypeCoercionError, UnknownTypeError};

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Render/parse format for timestamps on the store wire. Storage precision is
/// whole seconds.
pub const STORAGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest integer magnitude exactly representable as an f64.
const MAX_EXACT_FLOAT_INTEGER: u64 = 1 << 53;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    Integer,
    String,
    Float,
    Timestamp,
    Boolean,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Integer => f.write_str("Integer"),
            SemanticType::String => f.write_str("String"),
            SemanticType::Float => f.write_str("Float"),
            SemanticType::Timestamp => f.write_str("Timestamp"),
            SemanticType::Boolean => f.write_str("Boolean"),
        }
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    String(String),
    Float(f64),
    Timestamp(NaiveDateTime),
    Boolean(bool),
}

impl Value {
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Value::Integer(_) => SemanticType::Integer,
            Value::String(_) => SemanticType::String,
            Value::Float(_) => SemanticType::Float,
            Value::Timestamp(_) => SemanticType::Timestamp,
            Value::Boolean(_) => SemanticType::Boolean,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Float(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.format(STORAGE_TIMESTAMP_FORMAT)),
            Value::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// Map a semantic type to its storage-native type tag.
pub fn describe(semantic_type: SemanticType) -> &'static str {
    match semantic_type {
        SemanticType::Integer => "Int64",
        SemanticType::String => "String",
        SemanticType::Float => "Float64",
        SemanticType::Timestamp => "DateTime",
        SemanticType::Boolean => "Bool",
    }
}

/// Reverse map from a storage type tag.
pub fn semantic_from_storage(tag: &str) -> Result<SemanticType, UnknownTypeError> {
    match tag {
        "Int64" => Ok(SemanticType::Integer),
        "String" => Ok(SemanticType::String),
        "Float64" => Ok(SemanticType::Float),
        "DateTime" => Ok(SemanticType::Timestamp),
        "Bool" => Ok(SemanticType::Boolean),
        other => Err(UnknownTypeError {
            tag: other.to_string(),
        }),
    }
}

/// Coerce a raw cell value to its declared semantic type.
///
/// Matching tags pass through (timestamps truncated to storage precision).
/// Integers widen to Float only when exactly representable. Raw strings parse
/// into the numeric, boolean and timestamp types; timestamps use the single
/// `ts_format` supplied per call, with date-only formats resolving to
/// midnight. Everything else fails with [`TypeCoercionError`].
pub fn coerce(
    raw: &Value,
    target: SemanticType,
    ts_format: &str,
) -> Result<Value, TypeCoercionError> {
    match (raw, target) {
        (Value::Integer(v), SemanticType::Integer) => Ok(Value::Integer(*v)),
        (Value::String(v), SemanticType::String) => Ok(Value::String(v.clone())),
        (Value::Float(v), SemanticType::Float) => {
            if v.is_finite() {
                Ok(Value::Float(*v))
            } else {
                Err(TypeCoercionError::new(raw, target, "not a finite number"))
            }
        }
        (Value::Boolean(v), SemanticType::Boolean) => Ok(Value::Boolean(*v)),
        (Value::Timestamp(v), SemanticType::Timestamp) => {
            Ok(Value::Timestamp(truncate_to_seconds(*v)))
        }
        (Value::Integer(v), SemanticType::Float) => {
            if v.unsigned_abs() <= MAX_EXACT_FLOAT_INTEGER {
                Ok(Value::Float(*v as f64))
            } else {
                Err(TypeCoercionError::new(
                    raw,
                    target,
                    "integer is not exactly representable as a float",
                ))
            }
        }
        (Value::String(v), SemanticType::Integer) => v
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| TypeCoercionError::new(raw, target, "not an integer")),
        (Value::String(v), SemanticType::Float) => match v.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Ok(Value::Float(parsed)),
            _ => Err(TypeCoercionError::new(raw, target, "not a finite number")),
        },
        (Value::String(v), SemanticType::Boolean) => match v.trim() {
            "true" | "t" => Ok(Value::Boolean(true)),
            "false" | "f" => Ok(Value::Boolean(false)),
            _ => Err(TypeCoercionError::new(raw, target, "not a boolean")),
        },
        (Value::String(v), SemanticType::Timestamp) => {
            parse_timestamp(v.trim(), ts_format).map(Value::Timestamp)
        }
        (_, _) => Err(TypeCoercionError::new(
            raw,
            target,
            format!("value has type {}", raw.semantic_type()),
        )),
    }
}

/// Coerce a raw wire value read back from the store.
///
/// Sixty-four-bit integers come back as JSON strings from some formats, so
/// string payloads are re-parsed through [`coerce`].
pub fn coerce_json(
    raw: &serde_json::Value,
    target: SemanticType,
    ts_format: &str,
) -> Result<Value, TypeCoercionError> {
    use serde_json::Value as Json;

    match (raw, target) {
        (Json::Number(n), SemanticType::Integer) => n
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| TypeCoercionError::new(raw, target, "out of 64-bit integer range")),
        (Json::Number(n), SemanticType::Float) => match n.as_f64() {
            Some(parsed) if parsed.is_finite() => Ok(Value::Float(parsed)),
            _ => Err(TypeCoercionError::new(raw, target, "not a finite number")),
        },
        (Json::Bool(b), SemanticType::Boolean) => Ok(Value::Boolean(*b)),
        // ClickHouse renders Bool as 0/1 in some output formats.
        (Json::Number(n), SemanticType::Boolean) => match n.as_i64() {
            Some(0) => Ok(Value::Boolean(false)),
            Some(1) => Ok(Value::Boolean(true)),
            _ => Err(TypeCoercionError::new(raw, target, "not a boolean")),
        },
        (Json::String(s), _) => coerce(&Value::String(s.clone()), target, ts_format),
        (_, _) => Err(TypeCoercionError::new(
            raw,
            target,
            "incompatible wire value",
        )),
    }
}

fn parse_timestamp(raw: &str, format: &str) -> Result<NaiveDateTime, TypeCoercionError> {
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
        return Ok(parsed);
    }
    // Date-only formats carry no time component.
    NaiveDate::parse_from_str(raw, format)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| {
            TypeCoercionError::new(
                raw,
                SemanticType::Timestamp,
                format!("does not match format `{format}`"),
            )
        })
}

fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}
