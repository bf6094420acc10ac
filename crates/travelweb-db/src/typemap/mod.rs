//! Column type mapping between the MySQL and SQLite dialects.
//!
//! Every mapping goes native → [`CanonicalType`] → native, so the mapping is
//! total: a type neither parser knows becomes `CanonicalType::Unknown` and
//! renders as the target's text type with a warning.

mod canonical;

pub use canonical::{
    parse_mysql_type, parse_sqlite_type, quote_literal, render_mysql_type, render_sqlite_type,
    CanonicalType, TypeFamily, TypeMapping,
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Dialect;
use crate::core::ColumnDescriptor;

/// A column translated into the target dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column name.
    pub name: String,
    /// Target type keyword (e.g. "TEXT", "VARCHAR(255)").
    pub target_type: String,
    /// Rendered column definition for CREATE TABLE, without key clauses.
    pub definition: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the column is (part of) the primary key.
    pub is_primary_key: bool,
    /// Whether the target should generate values for this column.
    pub auto_increment: bool,
    /// Warning for lossy mappings.
    pub warning: Option<String>,
}

/// Maps column definitions from one dialect to another.
pub trait TypeMapper: Send + Sync {
    fn source_dialect(&self) -> Dialect;

    fn target_dialect(&self) -> Dialect;

    /// Map a native source type name to a target type.
    fn map_type(&self, native_type: &str) -> TypeMapping;

    /// Map a full column definition.
    fn map_column(&self, column: &ColumnDescriptor) -> ColumnMapping {
        let mapping = self.map_type(&column.native_type);
        if let Some(warning) = &mapping.warning {
            warn!("Column {}: {}", column.name, warning);
        }
        let definition = column_definition(self.target_dialect(), column, &mapping.target_type);

        ColumnMapping {
            name: column.name.clone(),
            target_type: mapping.target_type,
            definition,
            nullable: column.nullable,
            is_primary_key: column.is_primary_key,
            auto_increment: column.auto_increment,
            warning: mapping.warning,
        }
    }
}

/// MySQL → SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlToSqliteMapper;

impl TypeMapper for MysqlToSqliteMapper {
    fn source_dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn target_dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn map_type(&self, native_type: &str) -> TypeMapping {
        render_sqlite_type(&parse_mysql_type(native_type))
    }
}

/// SQLite → MySQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteToMysqlMapper;

impl TypeMapper for SqliteToMysqlMapper {
    fn source_dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn target_dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn map_type(&self, native_type: &str) -> TypeMapping {
        render_mysql_type(&parse_sqlite_type(native_type))
    }
}

/// Same-dialect mapper. Types pass through; an empty type (columns inferred
/// from schemaless records) falls back to the dialect's text type.
#[derive(Debug, Clone, Copy)]
pub struct IdentityMapper {
    dialect: Dialect,
}

impl IdentityMapper {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }
}

impl TypeMapper for IdentityMapper {
    fn source_dialect(&self) -> Dialect {
        self.dialect
    }

    fn target_dialect(&self) -> Dialect {
        self.dialect
    }

    fn map_type(&self, native_type: &str) -> TypeMapping {
        if native_type.trim().is_empty() {
            TypeMapping::lossy("TEXT", "Column without a declared type stored as TEXT")
        } else {
            TypeMapping::lossless(native_type.trim())
        }
    }
}

/// Mapper for a (source, target) dialect pair.
pub fn mapper_for(source: Dialect, target: Dialect) -> Arc<dyn TypeMapper> {
    match (source, target) {
        (Dialect::Mysql, Dialect::Sqlite) => Arc::new(MysqlToSqliteMapper),
        (Dialect::Sqlite, Dialect::Mysql) => Arc::new(SqliteToMysqlMapper),
        (dialect, _) => Arc::new(IdentityMapper::new(dialect)),
    }
}

/// Translate a MySQL column into the SQLite dialect.
pub fn convert_column_mysql_to_sqlite(column: &ColumnDescriptor) -> ColumnMapping {
    MysqlToSqliteMapper.map_column(column)
}

/// Translate a SQLite column into the MySQL dialect.
pub fn convert_column_sqlite_to_mysql(column: &ColumnDescriptor) -> ColumnMapping {
    SqliteToMysqlMapper.map_column(column)
}

/// Quote an identifier for a dialect.
pub fn quote_ident(dialect: Dialect, name: &str) -> String {
    match dialect {
        Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
        Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

/// Keywords and functions accepted verbatim as DEFAULT values.
const DEFAULT_KEYWORDS: &[&str] = &[
    "NULL",
    "TRUE",
    "FALSE",
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIME",
    "LOCALTIMESTAMP",
];

/// Render a DEFAULT literal for the target dialect.
///
/// Numbers, quoted strings, keywords and parenthesized expressions pass
/// through. Anything else is a bare string and gets single-quoted.
pub fn render_default(dialect: Dialect, raw: &str) -> String {
    let value = raw.trim();
    let upper = value.to_ascii_uppercase();

    // MySQL's NOW()/CURRENT_TIMESTAMP(n) spellings
    let is_now = upper == "NOW()" || upper.starts_with("CURRENT_TIMESTAMP(");
    if is_now {
        return match dialect {
            Dialect::Sqlite => "CURRENT_TIMESTAMP".to_string(),
            Dialect::Mysql => value.to_string(),
        };
    }

    let numeric = value.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
        && value.parse::<f64>().is_ok();
    let verbatim = numeric
        || (value.len() >= 2 && value.starts_with('\'') && value.ends_with('\''))
        || (value.starts_with('(') && value.ends_with(')'))
        || DEFAULT_KEYWORDS.contains(&upper.as_str())
        || ((upper.starts_with("B'") || upper.starts_with("X'")) && value.ends_with('\''));

    if verbatim {
        value.to_string()
    } else {
        quote_literal(raw)
    }
}

fn column_definition(dialect: Dialect, column: &ColumnDescriptor, target_type: &str) -> String {
    let mut def = format!("{} {}", quote_ident(dialect, &column.name), target_type);
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default_value {
        def.push_str(" DEFAULT ");
        def.push_str(&render_default(dialect, default));
    }
    if column.auto_increment && dialect == Dialect::Mysql {
        def.push_str(" AUTO_INCREMENT");
    }
    def
}

/// Render one CREATE TABLE statement from mapped columns.
///
/// On SQLite a single auto-increment integer key is declared inline as
/// `INTEGER PRIMARY KEY AUTOINCREMENT`; every other key becomes a
/// table-level `PRIMARY KEY (...)` clause.
pub fn build_create_table(
    dialect: Dialect,
    table: &str,
    columns: &[ColumnMapping],
    primary_key: &[String],
) -> String {
    let inline_pk = dialect == Dialect::Sqlite
        && primary_key.len() == 1
        && columns
            .iter()
            .any(|c| c.name == primary_key[0] && c.auto_increment && c.target_type == "INTEGER");

    let mut defs: Vec<String> = columns
        .iter()
        .map(|c| {
            if inline_pk && c.name == primary_key[0] {
                format!(
                    "{} INTEGER PRIMARY KEY AUTOINCREMENT",
                    quote_ident(dialect, &c.name)
                )
            } else {
                c.definition.clone()
            }
        })
        .collect();

    if !primary_key.is_empty() && !inline_pk {
        let keys: Vec<String> = primary_key.iter().map(|k| quote_ident(dialect, k)).collect();
        defs.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    format!(
        "CREATE TABLE {} (\n  {}\n)",
        quote_ident(dialect, table),
        defs.join(",\n  ")
    )
}
