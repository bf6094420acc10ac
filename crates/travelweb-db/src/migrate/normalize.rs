//! Value normalization for cross-backend copies.

use crate::core::SqlValue;

/// Rewrite a source value into a form every target accepts: temporal values
/// become ISO-8601 text, booleans become 0/1 and JSON becomes its text.
pub fn normalize_value(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Bool(b) => SqlValue::Int(i64::from(b)),
        SqlValue::Date(d) => SqlValue::Text(d.format("%Y-%m-%d").to_string()),
        SqlValue::DateTime(dt) => SqlValue::Text(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        SqlValue::Time(t) => SqlValue::Text(t.format("%H:%M:%S%.f").to_string()),
        SqlValue::Json(json) => match json {
            serde_json::Value::Null => SqlValue::Null,
            serde_json::Value::String(s) => SqlValue::Text(s),
            other => SqlValue::Text(other.to_string()),
        },
        other => other,
    }
}
