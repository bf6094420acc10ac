//! Column and table metadata used by introspection, the type mapper and
//! schema bootstrapping.

use serde::{Deserialize, Serialize};

/// One column definition in a backend's native type system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Native type name as the backend reports it (e.g. `varchar(255)`, `INTEGER`).
    pub native_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Default value literal, verbatim as introspected.
    pub default_value: Option<String>,
    /// Whether the column is (part of) the primary key.
    pub is_primary_key: bool,
    /// Whether the backend generates values for this column.
    #[serde(default)]
    pub auto_increment: bool,
}

impl ColumnDescriptor {
    /// Create a nullable, non-key column.
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            nullable: true,
            default_value: None,
            is_primary_key: false,
            auto_increment: false,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the default literal.
    pub fn default(mut self, literal: impl Into<String>) -> Self {
        self.default_value = Some(literal.into());
        self
    }

    /// Mark the column as an auto-increment primary key.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self.auto_increment = true;
        self
    }
}

/// Table structure: ordered columns plus index names reported by the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name.
    pub name: String,
    /// Column definitions in ordinal order.
    pub columns: Vec<ColumnDescriptor>,
    /// Secondary index names (informational, not recreated).
    #[serde(default)]
    pub indexes: Vec<String>,
}

impl TableDefinition {
    /// Create a table definition from columns.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes: Vec::new(),
        }
    }

    /// Primary key column names in ordinal order.
    pub fn primary_key(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Column names in ordinal order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}
