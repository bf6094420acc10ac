//! Canonical column types.
//!
//! Native type names are parsed into a [`CanonicalType`] and rendered back
//! out in the target dialect, so each dialect needs one parser and one
//! renderer instead of one mapper per dialect pair.
//!
//! ```text
//! MySQL          →  CanonicalType   →  SQLite
//! VARCHAR(255)   →  Varchar(255)    →  TEXT
//! TINYINT(1)     →  Boolean         →  INTEGER
//! ```

use std::fmt;

/// Database-agnostic column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    /// Single-precision float.
    Real,
    /// Double-precision float.
    Double,
    /// Exact decimal: total digits and digits after the point.
    Decimal {
        precision: u32,
        scale: u32,
    },
    Char(u32),
    Varchar(u32),
    Text,
    Blob,
    Date,
    DateTime,
    Time,
    Year,
    Json,
    /// MySQL ENUM with its permitted values.
    Enum(Vec<String>),
    /// A type name neither dialect recognizes. Carries the original text.
    Unknown(String),
}

/// Storage family of a canonical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Integer,
    Real,
    Numeric,
    Text,
    Blob,
    Temporal,
}

impl CanonicalType {
    pub fn family(&self) -> TypeFamily {
        match self {
            CanonicalType::Boolean
            | CanonicalType::TinyInt
            | CanonicalType::SmallInt
            | CanonicalType::Int
            | CanonicalType::BigInt
            | CanonicalType::Year => TypeFamily::Integer,
            CanonicalType::Real | CanonicalType::Double => TypeFamily::Real,
            CanonicalType::Decimal { .. } => TypeFamily::Numeric,
            CanonicalType::Char(_)
            | CanonicalType::Varchar(_)
            | CanonicalType::Text
            | CanonicalType::Json
            | CanonicalType::Enum(_)
            | CanonicalType::Unknown(_) => TypeFamily::Text,
            CanonicalType::Blob => TypeFamily::Blob,
            CanonicalType::Date | CanonicalType::DateTime | CanonicalType::Time => {
                TypeFamily::Temporal
            }
        }
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalType::Decimal { precision, scale } => {
                write!(f, "Decimal({},{})", precision, scale)
            }
            CanonicalType::Char(n) => write!(f, "Char({})", n),
            CanonicalType::Varchar(n) => write!(f, "Varchar({})", n),
            CanonicalType::Enum(values) => write!(f, "Enum({:?})", values),
            CanonicalType::Unknown(raw) => write!(f, "Unknown({})", raw),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Target type produced by a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Target type string (e.g. "VARCHAR(255)", "INTEGER").
    pub target_type: String,
    /// Whether this mapping loses data, precision or constraints.
    pub is_lossy: bool,
    /// Warning message for lossy mappings.
    pub warning: Option<String>,
}

impl TypeMapping {
    pub fn lossless(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            is_lossy: false,
            warning: None,
        }
    }

    pub fn lossy(target_type: impl Into<String>, warning: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            is_lossy: true,
            warning: Some(warning.into()),
        }
    }
}

/// A native type split into its base name, parenthesized arguments and
/// trailing modifiers: `int(10) unsigned` → (`int`, [`10`], unsigned).
struct NativeType {
    base: String,
    args: Vec<String>,
    unsigned: bool,
}

impl NativeType {
    fn parse(native: &str) -> Self {
        let trimmed = native.trim();
        let (head, args, tail) = match (trimmed.find('('), trimmed.rfind(')')) {
            (Some(open), Some(close)) if close > open => (
                &trimmed[..open],
                split_args(&trimmed[open + 1..close]),
                &trimmed[close + 1..],
            ),
            _ => (trimmed, Vec::new(), ""),
        };

        let mut unsigned = false;
        let words: Vec<String> = head
            .split_whitespace()
            .chain(tail.split_whitespace())
            .map(str::to_lowercase)
            .filter(|w| match w.as_str() {
                "unsigned" => {
                    unsigned = true;
                    false
                }
                "signed" | "zerofill" => false,
                _ => true,
            })
            .collect();

        Self {
            base: words.join(" "),
            args,
            unsigned,
        }
    }

    fn arg(&self, index: usize) -> Option<u32> {
        self.args.get(index).and_then(|a| a.trim().parse().ok())
    }
}

/// Split `a, 'b,c', d` on top-level commas, keeping quoted commas.
fn split_args(raw: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' if in_quote && chars.peek() == Some(&'\'') => {
                current.push_str("''");
                chars.next();
            }
            '\'' => {
                in_quote = !in_quote;
                current.push(c);
            }
            ',' if !in_quote => args.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() || !args.is_empty() {
        args.push(current.trim().to_string());
    }
    args
}

fn unquote(value: &str) -> String {
    let v = value.trim();
    if v.len() >= 2 && v.starts_with('\'') && v.ends_with('\'') {
        v[1..v.len() - 1].replace("''", "'")
    } else {
        v.to_string()
    }
}

/// Parse a MySQL column type (`COLUMN_TYPE` form, e.g. `int(11) unsigned`).
pub fn parse_mysql_type(native: &str) -> CanonicalType {
    let t = NativeType::parse(native);
    match t.base.as_str() {
        "bool" | "boolean" => CanonicalType::Boolean,
        "tinyint" if t.arg(0) == Some(1) => CanonicalType::Boolean,
        "tinyint" if t.unsigned => CanonicalType::SmallInt,
        "tinyint" => CanonicalType::TinyInt,
        "smallint" if t.unsigned => CanonicalType::Int,
        "smallint" => CanonicalType::SmallInt,
        "mediumint" => CanonicalType::Int,
        "int" | "integer" if t.unsigned => CanonicalType::BigInt,
        "int" | "integer" => CanonicalType::Int,
        "bigint" | "serial" => CanonicalType::BigInt,
        "bit" if t.arg(0).unwrap_or(1) == 1 => CanonicalType::Boolean,
        "bit" => CanonicalType::BigInt,

        "float" => CanonicalType::Real,
        "double" | "double precision" | "real" => CanonicalType::Double,
        "decimal" | "numeric" | "dec" | "fixed" => CanonicalType::Decimal {
            precision: t.arg(0).unwrap_or(10),
            scale: t.arg(1).unwrap_or(0),
        },

        "char" | "nchar" => CanonicalType::Char(t.arg(0).unwrap_or(1)),
        "varchar" | "nvarchar" => CanonicalType::Varchar(t.arg(0).unwrap_or(255)),
        "tinytext" | "text" | "mediumtext" | "longtext" => CanonicalType::Text,
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            CanonicalType::Blob
        }

        "date" => CanonicalType::Date,
        "datetime" | "timestamp" => CanonicalType::DateTime,
        "time" => CanonicalType::Time,
        "year" => CanonicalType::Year,
        "json" => CanonicalType::Json,
        "enum" => CanonicalType::Enum(t.args.iter().map(|a| unquote(a)).collect()),

        _ => CanonicalType::Unknown(native.trim().to_string()),
    }
}

/// Parse a SQLite declared type. Exact names are matched first, then
/// SQLite's affinity rules decide.
pub fn parse_sqlite_type(native: &str) -> CanonicalType {
    let t = NativeType::parse(native);
    match t.base.as_str() {
        "bool" | "boolean" => CanonicalType::Boolean,
        "tinyint" => CanonicalType::TinyInt,
        "smallint" | "int2" => CanonicalType::SmallInt,
        "int" | "integer" | "mediumint" => CanonicalType::Int,
        "bigint" | "int8" | "big int" => CanonicalType::BigInt,
        "real" | "double" | "double precision" | "float" => CanonicalType::Double,
        "numeric" | "decimal" => CanonicalType::Decimal {
            precision: t.arg(0).unwrap_or(10),
            scale: t.arg(1).unwrap_or(0),
        },
        "char" | "character" | "nchar" => CanonicalType::Char(t.arg(0).unwrap_or(1)),
        "varchar" | "varying character" | "nvarchar" => {
            CanonicalType::Varchar(t.arg(0).unwrap_or(255))
        }
        "text" | "clob" => CanonicalType::Text,
        "blob" | "" => CanonicalType::Blob,
        "date" => CanonicalType::Date,
        "datetime" | "timestamp" => CanonicalType::DateTime,
        "time" => CanonicalType::Time,
        "json" => CanonicalType::Json,
        other if other.contains("int") => CanonicalType::Int,
        other if ["char", "clob", "text"].iter().any(|s| other.contains(s)) => CanonicalType::Text,
        other if other.contains("blob") => CanonicalType::Blob,
        other if ["real", "floa", "doub"].iter().any(|s| other.contains(s)) => {
            CanonicalType::Double
        }
        _ => CanonicalType::Unknown(native.trim().to_string()),
    }
}

/// Render a canonical type as a MySQL column type.
pub fn render_mysql_type(canonical: &CanonicalType) -> TypeMapping {
    match canonical {
        CanonicalType::Boolean => TypeMapping::lossless("TINYINT(1)"),
        CanonicalType::TinyInt => TypeMapping::lossless("TINYINT"),
        CanonicalType::SmallInt => TypeMapping::lossless("SMALLINT"),
        CanonicalType::Int => TypeMapping::lossless("INT"),
        CanonicalType::BigInt => TypeMapping::lossless("BIGINT"),
        CanonicalType::Real => TypeMapping::lossless("FLOAT"),
        CanonicalType::Double => TypeMapping::lossless("DOUBLE"),
        CanonicalType::Decimal { precision, scale } => {
            let p = (*precision).clamp(1, 65);
            let s = (*scale).min(30).min(p);
            if p != *precision || s != *scale {
                TypeMapping::lossy(
                    format!("DECIMAL({},{})", p, s),
                    format!(
                        "DECIMAL({},{}) exceeds MySQL limits, narrowed to ({},{})",
                        precision, scale, p, s
                    ),
                )
            } else {
                TypeMapping::lossless(format!("DECIMAL({},{})", p, s))
            }
        }
        CanonicalType::Char(n) if *n <= 255 => TypeMapping::lossless(format!("CHAR({})", n)),
        CanonicalType::Char(_) => TypeMapping::lossless("TEXT"),
        CanonicalType::Varchar(n) if *n > 0 && *n <= 16383 => {
            TypeMapping::lossless(format!("VARCHAR({})", n))
        }
        CanonicalType::Varchar(_) => TypeMapping::lossless("LONGTEXT"),
        CanonicalType::Text => TypeMapping::lossless("TEXT"),
        CanonicalType::Blob => TypeMapping::lossless("LONGBLOB"),
        CanonicalType::Date => TypeMapping::lossless("DATE"),
        CanonicalType::DateTime => TypeMapping::lossless("DATETIME"),
        CanonicalType::Time => TypeMapping::lossless("TIME"),
        CanonicalType::Year => TypeMapping::lossless("YEAR"),
        CanonicalType::Json => TypeMapping::lossless("JSON"),
        CanonicalType::Enum(values) if values.is_empty() => {
            TypeMapping::lossy("VARCHAR(255)", "ENUM without values stored as VARCHAR(255)")
        }
        CanonicalType::Enum(values) => {
            let quoted: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
            TypeMapping::lossless(format!("ENUM({})", quoted.join(",")))
        }
        CanonicalType::Unknown(raw) => {
            TypeMapping::lossy("TEXT", format!("Unknown type '{}' stored as TEXT", raw))
        }
    }
}

/// Render a canonical type as a SQLite declared type.
pub fn render_sqlite_type(canonical: &CanonicalType) -> TypeMapping {
    match canonical {
        CanonicalType::Boolean
        | CanonicalType::TinyInt
        | CanonicalType::SmallInt
        | CanonicalType::Int
        | CanonicalType::BigInt
        | CanonicalType::Year => TypeMapping::lossless("INTEGER"),
        CanonicalType::Real | CanonicalType::Double => TypeMapping::lossless("REAL"),
        CanonicalType::Decimal { .. } => TypeMapping::lossless("NUMERIC"),
        CanonicalType::Char(_) | CanonicalType::Varchar(_) | CanonicalType::Text => {
            TypeMapping::lossless("TEXT")
        }
        CanonicalType::Json => TypeMapping::lossless("TEXT"),
        CanonicalType::Blob => TypeMapping::lossless("BLOB"),
        CanonicalType::Date => TypeMapping::lossless("DATE"),
        CanonicalType::DateTime => TypeMapping::lossless("DATETIME"),
        CanonicalType::Time => TypeMapping::lossless("TIME"),
        CanonicalType::Enum(values) => TypeMapping::lossy(
            "TEXT",
            format!("ENUM values {:?} are not enforced in TEXT", values),
        ),
        CanonicalType::Unknown(raw) => {
            TypeMapping::lossy("TEXT", format!("Unknown type '{}' stored as TEXT", raw))
        }
    }
}

/// Single-quote a string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mysql_integers() {
        assert_eq!(parse_mysql_type("int(11)"), CanonicalType::Int);
        assert_eq!(parse_mysql_type("INT UNSIGNED"), CanonicalType::BigInt);
        assert_eq!(parse_mysql_type("int(10) unsigned"), CanonicalType::BigInt);
        assert_eq!(parse_mysql_type("tinyint(1)"), CanonicalType::Boolean);
        assert_eq!(parse_mysql_type("tinyint(4)"), CanonicalType::TinyInt);
        assert_eq!(parse_mysql_type("BIGINT"), CanonicalType::BigInt);
        assert_eq!(parse_mysql_type("bit(1)"), CanonicalType::Boolean);
    }

    #[test]
    fn test_parse_mysql_strings_and_decimals() {
        assert_eq!(parse_mysql_type("varchar(255)"), CanonicalType::Varchar(255));
        assert_eq!(parse_mysql_type("VARCHAR"), CanonicalType::Varchar(255));
        assert_eq!(parse_mysql_type("longtext"), CanonicalType::Text);
        assert_eq!(
            parse_mysql_type("decimal(10,2)"),
            CanonicalType::Decimal {
                precision: 10,
                scale: 2
            }
        );
        assert_eq!(parse_mysql_type("timestamp"), CanonicalType::DateTime);
    }

    #[test]
    fn test_parse_mysql_enum() {
        assert_eq!(
            parse_mysql_type("enum('draft','published','it''s')"),
            CanonicalType::Enum(vec![
                "draft".to_string(),
                "published".to_string(),
                "it's".to_string()
            ])
        );
        assert_eq!(
            render_mysql_type(&parse_mysql_type("ENUM('a,b','c')")).target_type,
            "ENUM('a,b','c')"
        );
    }

    #[test]
    fn test_parse_sqlite_affinity() {
        assert_eq!(parse_sqlite_type("INTEGER"), CanonicalType::Int);
        assert_eq!(parse_sqlite_type("UNSIGNED BIG INT"), CanonicalType::BigInt);
        assert_eq!(parse_sqlite_type("MEDIUMINTEGER"), CanonicalType::Int);
        assert_eq!(parse_sqlite_type("NATIVE CHARACTER(70)"), CanonicalType::Text);
        assert_eq!(parse_sqlite_type("VARCHAR(80)"), CanonicalType::Varchar(80));
        assert_eq!(parse_sqlite_type(""), CanonicalType::Blob);
        assert_eq!(parse_sqlite_type("FLOATING POINT"), CanonicalType::Int);
        assert_eq!(parse_sqlite_type("DOUBLE"), CanonicalType::Double);
        assert_eq!(
            parse_sqlite_type("GEOMETRY"),
            CanonicalType::Unknown("GEOMETRY".into())
        );
    }

    #[test]
    fn test_render_mysql() {
        assert_eq!(render_mysql_type(&CanonicalType::Boolean).target_type, "TINYINT(1)");
        assert_eq!(
            render_mysql_type(&CanonicalType::Varchar(100)).target_type,
            "VARCHAR(100)"
        );
        assert_eq!(
            render_mysql_type(&CanonicalType::Varchar(70000)).target_type,
            "LONGTEXT"
        );
        let narrowed = render_mysql_type(&CanonicalType::Decimal {
            precision: 80,
            scale: 2,
        });
        assert_eq!(narrowed.target_type, "DECIMAL(65,2)");
        assert!(narrowed.is_lossy);
    }

    #[test]
    fn test_render_sqlite() {
        assert_eq!(render_sqlite_type(&CanonicalType::BigInt).target_type, "INTEGER");
        assert_eq!(render_sqlite_type(&CanonicalType::Varchar(9)).target_type, "TEXT");
        assert_eq!(render_sqlite_type(&CanonicalType::DateTime).target_type, "DATETIME");
        let unknown = render_sqlite_type(&CanonicalType::Unknown("point".into()));
        assert_eq!(unknown.target_type, "TEXT");
        assert!(unknown.warning.unwrap().contains("point"));
    }

    #[test]
    fn test_families() {
        assert_eq!(CanonicalType::Year.family(), TypeFamily::Integer);
        assert_eq!(
            CanonicalType::Decimal {
                precision: 1,
                scale: 0
            }
            .family(),
            TypeFamily::Numeric
        );
        assert_eq!(CanonicalType::Time.family(), TypeFamily::Temporal);
        assert_eq!(CanonicalType::Unknown("x".into()).family(), TypeFamily::Text);
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("10, 2"), vec!["10", "2"]);
        assert_eq!(split_args("'a,b','c'"), vec!["'a,b'", "'c'"]);
        assert!(split_args("").is_empty());
    }
}
