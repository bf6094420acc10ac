//! Conversions between [`SqlValue`] and `mysql_async::Value`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use mysql_async::consts::ColumnType;
use mysql_async::{Column, Params, Row, Value};

use crate::core::{QueryResult, Record, SqlValue};

/// Character set id MySQL reports for binary columns.
const BINARY_CHARSET: u16 = 63;

/// Convert SqlValue to mysql_async::Value.
pub fn sql_value_to_mysql(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Bool(b) => Value::Int(i64::from(*b)),
        SqlValue::Int(i) => Value::Int(*i),
        SqlValue::UInt(u) => Value::UInt(*u),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
        SqlValue::Bytes(b) => Value::Bytes(b.clone()),
        SqlValue::Date(d) => Value::Date(
            u16::try_from(d.year()).unwrap_or(0),
            d.month() as u8,
            d.day() as u8,
            0,
            0,
            0,
            0,
        ),
        SqlValue::DateTime(dt) => Value::Date(
            u16::try_from(dt.year()).unwrap_or(0),
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.nanosecond() / 1_000,
        ),
        SqlValue::Time(t) => Value::Time(
            false,
            0,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1_000,
        ),
        SqlValue::Json(v) => Value::Bytes(v.to_string().into_bytes()),
    }
}

/// Positional statement parameters.
pub fn to_params(params: &[SqlValue]) -> Params {
    if params.is_empty() {
        Params::Empty
    } else {
        Params::Positional(params.iter().map(sql_value_to_mysql).collect())
    }
}

/// Convert a result row to a record, keeping column order.
pub fn row_to_record(mut row: Row) -> Record {
    let columns = row.columns();
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = row.take::<Value, _>(i).unwrap_or(Value::NULL);
            (column.name_str().into_owned(), mysql_to_sql_value(value, column))
        })
        .collect()
}

/// Convert a driver value using its column metadata.
///
/// Binary-protocol results arrive typed; text-protocol results arrive as
/// bytes and are parsed according to the column type.
pub fn mysql_to_sql_value(value: Value, column: &Column) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Int(i) => SqlValue::Int(i),
        Value::UInt(u) => i64::try_from(u).map(SqlValue::Int).unwrap_or(SqlValue::UInt(u)),
        Value::Float(f) => SqlValue::Float(f64::from(f)),
        Value::Double(d) => SqlValue::Float(d),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day));
            match (date, column.column_type()) {
                (Some(date), ColumnType::MYSQL_TYPE_DATE) => SqlValue::Date(date),
                (Some(date), _) => date
                    .and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                    .map(SqlValue::DateTime)
                    .unwrap_or(SqlValue::Null),
                // Zero dates (0000-00-00) have no calendar value.
                (None, _) => SqlValue::Null,
            }
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            if !negative && days == 0 {
                if let Some(t) = NaiveTime::from_hms_micro_opt(
                    u32::from(hours),
                    u32::from(minutes),
                    u32::from(seconds),
                    micros,
                ) {
                    return SqlValue::Time(t);
                }
            }
            let total_hours = days * 24 + u32::from(hours);
            SqlValue::Text(format!(
                "{}{:02}:{:02}:{:02}",
                if negative { "-" } else { "" },
                total_hours,
                minutes,
                seconds
            ))
        }
        Value::Bytes(bytes) => from_text_bytes(bytes, column),
    }
}

fn is_binary(column: &Column) -> bool {
    column.character_set() == BINARY_CHARSET
        && matches!(
            column.column_type(),
            ColumnType::MYSQL_TYPE_BLOB
                | ColumnType::MYSQL_TYPE_TINY_BLOB
                | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
                | ColumnType::MYSQL_TYPE_LONG_BLOB
                | ColumnType::MYSQL_TYPE_STRING
                | ColumnType::MYSQL_TYPE_VAR_STRING
                | ColumnType::MYSQL_TYPE_VARCHAR
                | ColumnType::MYSQL_TYPE_BIT
        )
}

fn from_text_bytes(bytes: Vec<u8>, column: &Column) -> SqlValue {
    if is_binary(column) {
        return SqlValue::Bytes(bytes);
    }
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => return SqlValue::Bytes(e.into_bytes()),
    };

    match column.column_type() {
        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_LONGLONG
        | ColumnType::MYSQL_TYPE_YEAR => match text.parse::<i64>() {
            Ok(i) => SqlValue::Int(i),
            Err(_) => text
                .parse::<u64>()
                .map(SqlValue::UInt)
                .unwrap_or(SqlValue::Text(text)),
        },
        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => text
            .parse::<f64>()
            .map(SqlValue::Float)
            .unwrap_or(SqlValue::Text(text)),
        ColumnType::MYSQL_TYPE_DATE => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(SqlValue::Date)
            .unwrap_or(SqlValue::Null),
        ColumnType::MYSQL_TYPE_DATETIME | ColumnType::MYSQL_TYPE_TIMESTAMP => {
            NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f")
                .map(SqlValue::DateTime)
                .unwrap_or(SqlValue::Null)
        }
        ColumnType::MYSQL_TYPE_TIME => NaiveTime::parse_from_str(&text, "%H:%M:%S%.f")
            .map(SqlValue::Time)
            .unwrap_or(SqlValue::Text(text)),
        ColumnType::MYSQL_TYPE_JSON => serde_json::from_str(&text)
            .map(SqlValue::Json)
            .unwrap_or(SqlValue::Text(text)),
        // DECIMAL stays text to keep its exact digits.
        _ => SqlValue::Text(text),
    }
}

/// Changed-row count from the server's info string
/// (`Rows matched: 3  Changed: 2  Warnings: 0`).
pub fn parse_changed_rows(info: &str) -> Option<u64> {
    let start = info.find("Changed:")? + "Changed:".len();
    info[start..].split_whitespace().next()?.parse().ok()
}

/// Write counters of the last statement on a connection or transaction.
pub fn write_result(affected_rows: u64, insert_id: Option<u64>, info: &str) -> QueryResult {
    QueryResult {
        affected_rows,
        insert_id: insert_id.unwrap_or(0),
        changed_rows: parse_changed_rows(info).unwrap_or(affected_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(column_type: ColumnType) -> Column {
        Column::new(column_type).with_name(b"c")
    }

    #[test]
    fn test_sql_value_to_mysql() {
        assert_eq!(sql_value_to_mysql(&SqlValue::Null), Value::NULL);
        assert_eq!(sql_value_to_mysql(&SqlValue::Bool(true)), Value::Int(1));
        assert_eq!(
            sql_value_to_mysql(&SqlValue::from("Lisbon")),
            Value::Bytes(b"Lisbon".to_vec())
        );
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(8, 30, 15, 250)
            .unwrap();
        assert_eq!(
            sql_value_to_mysql(&SqlValue::DateTime(dt)),
            Value::Date(2024, 5, 1, 8, 30, 15, 250)
        );
    }

    #[test]
    fn test_text_protocol_parsing() {
        assert_eq!(
            mysql_to_sql_value(Value::Bytes(b"42".to_vec()), &column(ColumnType::MYSQL_TYPE_LONG)),
            SqlValue::Int(42)
        );
        assert_eq!(
            mysql_to_sql_value(
                Value::Bytes(b"19.90".to_vec()),
                &column(ColumnType::MYSQL_TYPE_NEWDECIMAL)
            ),
            SqlValue::Text("19.90".into())
        );
        assert_eq!(
            mysql_to_sql_value(
                Value::Bytes(b"2024-05-01 08:30:00".to_vec()),
                &column(ColumnType::MYSQL_TYPE_DATETIME)
            ),
            SqlValue::DateTime(
                NaiveDate::from_ymd_opt(2024, 5, 1)
                    .unwrap()
                    .and_hms_opt(8, 30, 0)
                    .unwrap()
            )
        );
        assert!(matches!(
            mysql_to_sql_value(
                Value::Bytes(br#"{"a":1}"#.to_vec()),
                &column(ColumnType::MYSQL_TYPE_JSON)
            ),
            SqlValue::Json(_)
        ));
    }

    #[test]
    fn test_binary_protocol_dates() {
        let date = mysql_to_sql_value(
            Value::Date(2024, 2, 29, 0, 0, 0, 0),
            &column(ColumnType::MYSQL_TYPE_DATE),
        );
        assert_eq!(
            date,
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        let zero = mysql_to_sql_value(
            Value::Date(0, 0, 0, 0, 0, 0, 0),
            &column(ColumnType::MYSQL_TYPE_DATETIME),
        );
        assert_eq!(zero, SqlValue::Null);
        let long_time = mysql_to_sql_value(
            Value::Time(false, 1, 2, 0, 0, 0),
            &column(ColumnType::MYSQL_TYPE_TIME),
        );
        assert_eq!(long_time, SqlValue::Text("26:00:00".into()));
    }

    #[test]
    fn test_parse_changed_rows() {
        assert_eq!(
            parse_changed_rows("Rows matched: 3  Changed: 2  Warnings: 0"),
            Some(2)
        );
        assert_eq!(parse_changed_rows(""), None);
    }

    #[test]
    fn test_params_empty_vs_positional() {
        assert_eq!(to_params(&[]), Params::Empty);
        assert_eq!(
            to_params(&[SqlValue::Int(1)]),
            Params::Positional(vec![Value::Int(1)])
        );
    }

    #[test]
    fn test_write_result_counts() {
        let update = write_result(3, Some(0), "Rows matched: 3  Changed: 1  Warnings: 0");
        assert_eq!(update.affected_rows, 3);
        assert_eq!(update.changed_rows, 1);
        assert_eq!(update.insert_id, 0);

        let insert = write_result(1, Some(42), "");
        assert_eq!(insert.insert_id, 42);
        assert_eq!(insert.changed_rows, 1);
    }
}
