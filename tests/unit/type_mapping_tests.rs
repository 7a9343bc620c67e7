use tableforge::type_mapping::{self, STORAGE_TIMESTAMP_FORMAT};
use tableforge::{SemanticType, Value};
use test_case::test_case;

#[test_case("42", SemanticType::Integer, Value::Integer(42))]
#[test_case("  42 ", SemanticType::Integer, Value::Integer(42); "padded_42")]
#[test_case("14.4", SemanticType::Float, Value::Float(14.4))]
#[test_case("t", SemanticType::Boolean, Value::Boolean(true))]
#[test_case("false", SemanticType::Boolean, Value::Boolean(false))]
fn string_cells_parse_into_declared_types(raw: &str, target: SemanticType, expected: Value) {
    let coerced = type_mapping::coerce(
        &Value::String(raw.to_string()),
        target,
        STORAGE_TIMESTAMP_FORMAT,
    )
    .expect("coercion succeeds");
    assert_eq!(coerced, expected);
}

#[test_case("abc", SemanticType::Integer)]
#[test_case("14.4", SemanticType::Integer)]
#[test_case("NaN", SemanticType::Float)]
#[test_case("yes", SemanticType::Boolean)]
fn malformed_strings_are_rejected(raw: &str, target: SemanticType) {
    let err = type_mapping::coerce(
        &Value::String(raw.to_string()),
        target,
        STORAGE_TIMESTAMP_FORMAT,
    )
    .unwrap_err();
    assert_eq!(err.target, target);
    assert_eq!(err.raw, raw);
}

#[test]
fn day_month_year_dates_parse_with_explicit_format() {
    let coerced = type_mapping::coerce(
        &Value::String("10/03/1957".to_string()),
        SemanticType::Timestamp,
        "%d/%m/%Y",
    )
    .expect("date parses");
    assert_eq!(coerced.to_string(), "1957-03-10 00:00:00");
}

#[test]
fn malformed_dates_are_rejected_not_guessed() {
    let err = type_mapping::coerce(
        &Value::String("not-a-date".to_string()),
        SemanticType::Timestamp,
        "%d/%m/%Y",
    )
    .unwrap_err();
    assert_eq!(err.target, SemanticType::Timestamp);
    assert!(err.reason.contains("%d/%m/%Y"));
}

#[test]
fn mismatched_value_types_do_not_convert_silently() {
    let err = type_mapping::coerce(
        &Value::Boolean(true),
        SemanticType::Integer,
        STORAGE_TIMESTAMP_FORMAT,
    )
    .unwrap_err();
    assert_eq!(err.target, SemanticType::Integer);
}

#[test]
fn quoted_64bit_integers_from_the_wire_reparse() {
    // JSONEachRow quotes Int64 values by default.
    let raw = serde_json::Value::String("9007199254740993".to_string());
    let coerced =
        type_mapping::coerce_json(&raw, SemanticType::Integer, STORAGE_TIMESTAMP_FORMAT)
            .expect("parses");
    assert_eq!(coerced, Value::Integer(9_007_199_254_740_993));
}

#[test]
fn numeric_booleans_from_the_wire_coerce() {
    let raw = serde_json::Value::from(1);
    let coerced =
        type_mapping::coerce_json(&raw, SemanticType::Boolean, STORAGE_TIMESTAMP_FORMAT)
            .expect("parses");
    assert_eq!(coerced, Value::Boolean(true));
}

#[test]
fn null_wire_values_are_rejected() {
    let err = type_mapping::coerce_json(
        &serde_json::Value::Null,
        SemanticType::String,
        STORAGE_TIMESTAMP_FORMAT,
    )
    .unwrap_err();
    assert_eq!(err.target, SemanticType::String);
}
