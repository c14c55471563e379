// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Field coercion for row values written through the API.
//!
//! Each logical field type has a fixed transform: the canonical value that
//! replaces an empty input (empty string or null), and an optional parse
//! step applied on write. The table is closed over [`FieldType`]; there is
//! no dynamic registration.
//!
//! # Behavior summary
//!
//! | Type | Empty value | Parse |
//! |------|-------------|-------|
//! | `Text`/`Longform`/`Formula` | `""` | - |
//! | `Options`/`Number`/`Boolean`/`Datetime` | `null` | number/datetime only |
//! | `Link`/`Array`/`Attachment` | `[]` | link only |
//! | `Auto` | - | always absent (server-assigned) |
//! | `Json` | - | structural parse, original on failure |
//!
//! Parse steps never fail: a value that cannot be coerced is passed through
//! unchanged. Malformed JSON in particular is deliberately swallowed.

use chrono::{DateTime, SecondsFormat};
use serde_json::{Number, Value};

/// Closed enumeration of logical field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text.
    Text,
    /// Multi-line text.
    Longform,
    /// One value from a fixed option list.
    Options,
    /// Floating point number.
    Number,
    /// True/false.
    Boolean,
    /// List of plain values.
    Array,
    /// ISO-8601 date-time.
    Datetime,
    /// List of attachment descriptors.
    Attachment,
    /// List of linked row identifiers.
    Link,
    /// Computed field; value is stored as text.
    Formula,
    /// Server-assigned value; client input is always discarded.
    Auto,
    /// Arbitrary JSON, accepted either structurally or as a string.
    Json,
}

/// The canonical value substituted when the incoming value is empty
/// (empty string or null). `None` means the empty input is handed to the
/// parse step untouched.
pub fn empty_value(field_type: FieldType) -> Option<Value> {
    match field_type {
        FieldType::Text | FieldType::Longform | FieldType::Formula => {
            Some(Value::String(String::new()))
        }
        FieldType::Options | FieldType::Number | FieldType::Boolean | FieldType::Datetime => {
            Some(Value::Null)
        }
        FieldType::Link | FieldType::Array | FieldType::Attachment => {
            Some(Value::Array(Vec::new()))
        }
        FieldType::Auto | FieldType::Json => None,
    }
}

/// Apply the full transform for a field type: empty-value substitution
/// followed by the parse step. Absent input stays absent.
pub fn coerce(field_type: FieldType, value: Option<Value>) -> Option<Value> {
    let value = value?;
    let value = if is_empty_input(&value) {
        match empty_value(field_type) {
            Some(substitute) => substitute,
            None => value,
        }
    } else {
        value
    };
    parse_value(field_type, value)
}

fn is_empty_input(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Apply the parse-on-write step for a field type.
///
/// Returns `None` when the parsed result is "absent" (auto fields, empty
/// JSON strings); otherwise the coerced value, or the original value when
/// coercion is not possible.
pub fn parse_value(field_type: FieldType, value: Value) -> Option<Value> {
    match field_type {
        FieldType::Link => Some(parse_link(value)),
        FieldType::Number => Some(parse_number(value)),
        FieldType::Datetime => Some(parse_datetime(value)),
        FieldType::Auto => None,
        FieldType::Json => parse_json(value),
        _ => Some(value),
    }
}

/// Normalize a link value into a plain list of row identifiers.
///
/// A list of linked-row objects becomes the list of their `_id`s; a single
/// identifier string becomes a one-element list; anything else passes
/// through unchanged.
fn parse_link(value: Value) -> Value {
    match value {
        Value::Array(items) if items.first().is_some_and(Value::is_object) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(mut obj) => obj.remove("_id").unwrap_or(Value::Object(obj)),
                    other => other,
                })
                .collect(),
        ),
        Value::String(s) => Value::Array(vec![Value::String(s)]),
        other => other,
    }
}

/// Coerce to floating point. String values parse their leading numeric
/// prefix, matching the permissive behavior builders rely on.
fn parse_number(value: Value) -> Value {
    match &value {
        Value::Number(_) => value,
        Value::String(s) => match leading_float(s) {
            Some(f) => Number::from_f64(f).map(Value::Number).unwrap_or(value),
            None => value,
        },
        _ => value,
    }
}

/// Longest numeric prefix of a string, `parseFloat`-style.
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<f64>().ok()
}

/// Convert a native timestamp (epoch milliseconds) to an ISO-8601 string;
/// other representations pass through unchanged.
fn parse_datetime(value: Value) -> Value {
    match &value {
        Value::Number(n) => match n.as_i64().and_then(DateTime::from_timestamp_millis) {
            Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => value,
        },
        _ => value,
    }
}

/// Structurally parse a JSON string. Malformed input returns the original
/// string unchanged; an empty string is treated as absent.
fn parse_json(value: Value) -> Option<Value> {
    match value {
        Value::String(s) => {
            if s.is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(&s) {
                Ok(parsed) => Some(parsed),
                Err(_) => Some(Value::String(s)),
            }
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_parses_leading_numeric_prefix() {
        assert_eq!(coerce(FieldType::Number, Some(json!("3.14abc"))), Some(json!(3.14)));
        assert_eq!(coerce(FieldType::Number, Some(json!("42"))), Some(json!(42.0)));
        assert_eq!(coerce(FieldType::Number, Some(json!("-7.5"))), Some(json!(-7.5)));
        // not numeric at all: passed through unchanged
        assert_eq!(coerce(FieldType::Number, Some(json!("abc"))), Some(json!("abc")));
    }

    #[test]
    fn test_number_empty_becomes_null() {
        assert_eq!(coerce(FieldType::Number, Some(json!(""))), Some(Value::Null));
        assert_eq!(coerce(FieldType::Number, Some(Value::Null)), Some(Value::Null));
        assert_eq!(coerce(FieldType::Number, None), None);
    }

    #[test]
    fn test_link_normalizes_object_list() {
        let input = json!([{"_id": "r1", "name": "one"}, {"_id": "r2"}]);
        assert_eq!(
            coerce(FieldType::Link, Some(input)),
            Some(json!(["r1", "r2"]))
        );
    }

    #[test]
    fn test_link_wraps_bare_identifier() {
        assert_eq!(coerce(FieldType::Link, Some(json!("r1"))), Some(json!(["r1"])));
    }

    #[test]
    fn test_link_plain_list_passes_through() {
        assert_eq!(
            coerce(FieldType::Link, Some(json!(["r1", "r2"]))),
            Some(json!(["r1", "r2"]))
        );
    }

    #[test]
    fn test_link_empty_becomes_empty_list() {
        assert_eq!(coerce(FieldType::Link, Some(json!(""))), Some(json!([])));
        assert_eq!(coerce(FieldType::Link, Some(Value::Null)), Some(json!([])));
    }

    #[test]
    fn test_json_malformed_returns_original() {
        assert_eq!(coerce(FieldType::Json, Some(json!("{bad"))), Some(json!("{bad")));
    }

    #[test]
    fn test_json_valid_string_is_parsed() {
        assert_eq!(
            coerce(FieldType::Json, Some(json!("{\"a\": 1}"))),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn test_json_empty_string_is_absent() {
        assert_eq!(coerce(FieldType::Json, Some(json!(""))), None);
    }

    #[test]
    fn test_json_structural_passes_through() {
        assert_eq!(
            coerce(FieldType::Json, Some(json!({"a": [1, 2]}))),
            Some(json!({"a": [1, 2]}))
        );
    }

    #[test]
    fn test_datetime_epoch_millis_to_iso() {
        assert_eq!(
            coerce(FieldType::Datetime, Some(json!(0))),
            Some(json!("1970-01-01T00:00:00.000Z"))
        );
    }

    #[test]
    fn test_datetime_string_passes_through() {
        assert_eq!(
            coerce(FieldType::Datetime, Some(json!("2025-06-01T12:00:00Z"))),
            Some(json!("2025-06-01T12:00:00Z"))
        );
    }

    #[test]
    fn test_auto_is_always_absent() {
        assert_eq!(coerce(FieldType::Auto, Some(json!("anything"))), None);
        assert_eq!(coerce(FieldType::Auto, None), None);
    }

    #[test]
    fn test_text_empty_values() {
        assert_eq!(coerce(FieldType::Text, Some(Value::Null)), Some(json!("")));
        assert_eq!(coerce(FieldType::Text, Some(json!("hi"))), Some(json!("hi")));
    }

    #[test]
    fn test_attachment_and_array_empty_values() {
        assert_eq!(coerce(FieldType::Attachment, Some(json!(""))), Some(json!([])));
        assert_eq!(coerce(FieldType::Array, Some(Value::Null)), Some(json!([])));
    }

    #[test]
    fn test_boolean_and_options_empty_values() {
        assert_eq!(coerce(FieldType::Boolean, Some(json!(""))), Some(Value::Null));
        assert_eq!(coerce(FieldType::Options, Some(json!(""))), Some(Value::Null));
        assert_eq!(coerce(FieldType::Boolean, Some(json!(true))), Some(json!(true)));
    }
}
