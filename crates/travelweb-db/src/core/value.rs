//! SQL value and record types shared by every backend.
//!
//! [`SqlValue`] is the currency of positional parameters and result cells.
//! On the JSON wire (file backend, CLI output) values are plain JSON scalars;
//! temporal values travel as ISO-8601 text.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single cell or parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer (MySQL UNSIGNED BIGINT).
    UInt(u64),
    /// Floating point.
    Float(f64),
    /// Text data.
    Text(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Timestamp without timezone.
    DateTime(NaiveDateTime),
    /// Time of day.
    Time(NaiveTime),
    /// Nested JSON (arrays/objects).
    Json(serde_json::Value),
}

impl SqlValue {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Integer view of the value, parsing numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::UInt(v) => i64::try_from(*v).ok(),
            SqlValue::Bool(b) => Some(*b as i64),
            SqlValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Floating point view of numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Int(v) => Some(*v as f64),
            SqlValue::UInt(v) => Some(*v as f64),
            SqlValue::Float(f) => Some(*f),
            SqlValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Borrow text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as text the way it would compare in a LIKE match.
    pub fn to_text(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Bool(b) => (*b as i64).to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::UInt(v) => v.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
            SqlValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            SqlValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            SqlValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            SqlValue::Time(t) => t.format("%H:%M:%S").to_string(),
            SqlValue::Json(v) => v.to_string(),
        }
    }

    /// Convert to a JSON value (temporal values become ISO-8601 strings).
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Bool(b) => Value::Bool(*b),
            SqlValue::Int(v) => Value::from(*v),
            SqlValue::UInt(v) => Value::from(*v),
            SqlValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SqlValue::Bytes(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
            SqlValue::Json(v) => v.clone(),
            SqlValue::Text(_) | SqlValue::Date(_) | SqlValue::DateTime(_) | SqlValue::Time(_) => {
                Value::String(self.to_text())
            }
        }
    }

    /// Build from a JSON value. Arrays and objects are kept as nested JSON.
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    SqlValue::UInt(u)
                } else {
                    SqlValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => SqlValue::Text(s),
            other => SqlValue::Json(other),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SqlValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(SqlValue::from_json)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::UInt(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// One row: an ordered mapping from column name to value.
///
/// Column order is the order columns were first inserted, which for query
/// results is the backend's column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, SqlValue)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a column value.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Set a column value, replacing in place if the column already exists.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Check whether a column is present.
    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Values in column order.
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keep only the named columns, in the given order.
    pub fn project(&self, columns: &[(String, String)]) -> Record {
        let mut out = Record::new();
        for (source, alias) in columns {
            out.set(alias.clone(), self.get(source).cloned().unwrap_or(SqlValue::Null));
        }
        out
    }
}

impl FromIterator<(String, SqlValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of column values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some((name, value)) = access.next_entry::<String, SqlValue>()? {
                    record.set(name, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Normalized outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Rows inserted, matched by an UPDATE, or deleted.
    pub affected_rows: u64,
    /// Id assigned by the last INSERT (0 when none).
    pub insert_id: u64,
    /// Rows whose contents actually changed.
    pub changed_rows: u64,
}

impl QueryResult {
    /// Result carrying only an affected row count.
    pub fn affected(rows: u64) -> Self {
        Self {
            affected_rows: rows,
            insert_id: 0,
            changed_rows: rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_insertion_order() {
        let record = Record::new()
            .with("title", "Lisbon")
            .with("id", 3)
            .with("views", 10);
        let cols: Vec<&str> = record.columns().collect();
        assert_eq!(cols, vec!["title", "id", "views"]);
    }

    #[test]
    fn test_record_set_replaces_in_place() {
        let mut record = Record::new().with("a", 1).with("b", 2);
        record.set("a", "changed");
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(&SqlValue::Text("changed".into())));
        assert_eq!(record.columns().next(), Some("a"));
    }

    #[test]
    fn test_record_json_keeps_document_order() {
        let record: Record = serde_json::from_str(r#"{"z":1,"a":"x","m":null}"#).unwrap();
        let cols: Vec<&str> = record.columns().collect();
        assert_eq!(cols, vec!["z", "a", "m"]);
        assert_eq!(record.get("m"), Some(&SqlValue::Null));
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"z":1,"a":"x","m":null}"#
        );
    }

    #[test]
    fn test_datetime_serializes_as_iso_text() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let json = serde_json::to_string(&SqlValue::DateTime(dt)).unwrap();
        assert_eq!(json, "\"2024-05-01T08:30:00.000Z\"");
    }

    #[test]
    fn test_as_i64_parses_text() {
        assert_eq!(SqlValue::Text(" 42 ".into()).as_i64(), Some(42));
        assert_eq!(SqlValue::Text("abc".into()).as_i64(), None);
        assert_eq!(SqlValue::Float(3.0).as_i64(), Some(3));
        assert_eq!(SqlValue::Float(3.5).as_i64(), None);
    }

    #[test]
    fn test_nested_json_round_trips_through_from_json() {
        let value = SqlValue::from_json(serde_json::json!({"tags": ["beach"]}));
        assert!(matches!(value, SqlValue::Json(_)));
        assert_eq!(value.to_text(), r#"{"tags":["beach"]}"#);
    }
}
