//! Value comparison and condition evaluation.

use std::cmp::Ordering;

use crate::core::{Record, SqlValue};
use crate::sql::{Condition, Operator};

/// `id` and `*_id` columns hold integer keys.
pub fn is_id_column(column: &str) -> bool {
    column == "id" || column.ends_with("_id")
}

/// Coerce numeric text bound to an ID-like column into an integer.
pub fn coerce_for_column(column: &str, value: SqlValue) -> SqlValue {
    if !is_id_column(column) {
        return value;
    }
    match &value {
        SqlValue::Text(s) => s.trim().parse::<i64>().map(SqlValue::Int).unwrap_or(value),
        _ => value,
    }
}

fn is_numeric(value: &SqlValue) -> bool {
    matches!(
        value,
        SqlValue::Int(_) | SqlValue::UInt(_) | SqlValue::Float(_) | SqlValue::Bool(_)
    )
}

/// SQL comparison. NULL compares with nothing.
///
/// Numbers compare numerically, and numeric text compares numerically
/// against numbers. Everything else compares by its text rendering, which
/// orders ISO-8601 timestamps chronologically.
pub fn compare(a: &SqlValue, b: &SqlValue) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }

    if let (SqlValue::Int(x), SqlValue::Int(y)) = (a, b) {
        return Some(x.cmp(y));
    }

    if is_numeric(a) || is_numeric(b) {
        if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
            return x.partial_cmp(&y);
        }
    }

    Some(a.to_text().cmp(&b.to_text()))
}

/// SQL equality (`=`).
pub fn equals(a: &SqlValue, b: &SqlValue) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

/// Whether two cells hold the same value, treating NULL as equal to NULL.
pub fn same_value(a: &SqlValue, b: &SqlValue) -> bool {
    (a.is_null() && b.is_null()) || equals(a, b)
}

/// ORDER BY comparison: NULLs sort first, incomparable values tie.
pub fn order(a: &SqlValue, b: &SqlValue) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare(a, b).unwrap_or(Ordering::Equal),
    }
}

/// Case-insensitive LIKE with `%` and `_` wildcards.
pub fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if let Some((star_p, star_t)) = backtrack {
            p = star_p + 1;
            t = star_t + 1;
            backtrack = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

/// Evaluate one WHERE condition against a record.
pub fn matches(record: &Record, condition: &Condition, params: &[SqlValue]) -> bool {
    let null = SqlValue::Null;
    let cell = record.get(&condition.column).unwrap_or(&null);
    let mut operands = condition
        .operands
        .iter()
        .map(|op| coerce_for_column(&condition.column, op.resolve(params)));

    match condition.op {
        Operator::In => operands.any(|v| equals(cell, &v)),
        op => {
            let value = operands.next().unwrap_or(SqlValue::Null);
            match op {
                Operator::Eq => equals(cell, &value),
                Operator::NotEq => compare(cell, &value).is_some_and(|o| o != Ordering::Equal),
                Operator::Gt => compare(cell, &value) == Some(Ordering::Greater),
                Operator::Lt => compare(cell, &value) == Some(Ordering::Less),
                Operator::Ge => compare(cell, &value).is_some_and(|o| o != Ordering::Less),
                Operator::Le => compare(cell, &value).is_some_and(|o| o != Ordering::Greater),
                Operator::Like => {
                    !cell.is_null() && !value.is_null() && like(&cell.to_text(), &value.to_text())
                }
                Operator::In => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Operand;

    #[test]
    fn test_numeric_text_compares_numerically() {
        assert!(equals(&SqlValue::Int(10), &SqlValue::Text("10".into())));
        assert_eq!(
            compare(&SqlValue::Int(9), &SqlValue::Text("10".into())),
            Some(Ordering::Less)
        );
        // Text against text stays lexical.
        assert_eq!(
            compare(&SqlValue::Text("9".into()), &SqlValue::Text("10".into())),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_null_never_equal() {
        assert!(!equals(&SqlValue::Null, &SqlValue::Null));
        assert!(same_value(&SqlValue::Null, &SqlValue::Null));
        assert_eq!(order(&SqlValue::Null, &SqlValue::Int(1)), Ordering::Less);
    }

    #[test]
    fn test_like_patterns() {
        assert!(like("Lisbon by Night", "%by%"));
        assert!(like("lisbon", "LIS_ON"));
        assert!(like("abc", "a%"));
        assert!(like("", "%"));
        assert!(!like("abc", "a_"));
        assert!(!like("abc", "%d%"));
        assert!(like("a%c", "a%%c"));
    }

    #[test]
    fn test_id_coercion() {
        assert_eq!(
            coerce_for_column("blog_id", SqlValue::Text("7".into())),
            SqlValue::Int(7)
        );
        assert_eq!(
            coerce_for_column("title", SqlValue::Text("7".into())),
            SqlValue::Text("7".into())
        );
    }

    #[test]
    fn test_matches_in_and_ranges() {
        let record = Record::new().with("id", 4).with("status", "published");
        let cond = Condition {
            column: "id".into(),
            op: Operator::In,
            operands: vec![Operand::Param(0), Operand::Literal(SqlValue::Int(4))],
        };
        assert!(matches(&record, &cond, &[SqlValue::Int(1)]));

        let cond = Condition {
            column: "id".into(),
            op: Operator::Ge,
            operands: vec![Operand::Param(0)],
        };
        assert!(matches(&record, &cond, &[SqlValue::Text("4".into())]));
        assert!(!matches(&record, &cond, &[SqlValue::Int(5)]));

        let cond = Condition {
            column: "missing".into(),
            op: Operator::NotEq,
            operands: vec![Operand::Literal(SqlValue::Int(1))],
        };
        assert!(!matches(&record, &cond, &[]));
    }
}
