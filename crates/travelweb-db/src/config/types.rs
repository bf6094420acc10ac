//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DbError;

/// Which concrete adapter a configuration builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Networked relational engine (MySQL/MariaDB).
    #[default]
    #[serde(alias = "relational-networked")]
    Mysql,
    /// In-process emulated relational store.
    #[serde(alias = "relational-emulated")]
    Sqlite,
    /// Emulated store persisted to a JSON document.
    #[serde(alias = "relational-emulated-file")]
    Json,
    /// Pure in-memory store.
    #[serde(alias = "in-memory")]
    Memory,
}

/// SQL dialect family of a backend, used to pick type mappers and
/// introspection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Mysql,
    Sqlite,
}

impl BackendKind {
    /// Stable identifier, also returned by `DatabaseAdapter::get_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mysql => "mysql",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Json => "json",
            BackendKind::Memory => "memory",
        }
    }

    /// Dialect family. All emulated stores speak the SQLite-like dialect.
    pub fn dialect(&self) -> Dialect {
        match self {
            BackendKind::Mysql => Dialect::Mysql,
            BackendKind::Sqlite | BackendKind::Json | BackendKind::Memory => Dialect::Sqlite,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" | "relational-networked" => Ok(BackendKind::Mysql),
            "sqlite" | "relational-emulated" => Ok(BackendKind::Sqlite),
            "json" | "file" | "relational-emulated-file" => Ok(BackendKind::Json),
            "memory" | "in-memory" => Ok(BackendKind::Memory),
            other => Err(DbError::Config(format!(
                "Unknown backend kind: '{}'. Supported kinds: mysql, sqlite, json, memory",
                other
            ))),
        }
    }
}

/// Adapter configuration. Its serialized form is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Backend kind (default: mysql).
    #[serde(default)]
    pub kind: BackendKind,

    /// Database host (default: localhost).
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username.
    #[serde(default = "default_user")]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Database name (default: travelweb).
    #[serde(default = "default_database")]
    pub database: String,

    /// JSON document path (json backend only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Maximum pooled connections (default: 10).
    #[serde(default = "default_connection_limit")]
    pub connection_limit: usize,

    /// Return an error instead of an empty result for statements the
    /// emulated interpreter cannot handle (default: false).
    #[serde(default)]
    pub strict_statements: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
            file_path: None,
            connection_limit: default_connection_limit(),
            strict_statements: false,
        }
    }
}

impl AdapterConfig {
    /// Configuration for a backend kind with all other fields defaulted.
    pub fn for_kind(kind: BackendKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// JSON file backend at `path`.
    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Self::for_kind(BackendKind::Json)
        }
    }

    /// Copy of this configuration safe for logs and status output.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.password.is_empty() {
            copy.password = "********".to_string();
        }
        copy
    }
}

/// Options for one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateOptions {
    /// Tables to migrate (empty = every source table).
    #[serde(default)]
    pub tables: Vec<String>,

    /// Drop and recreate target tables that already exist (default: false).
    #[serde(default)]
    pub drop_existing: bool,

    /// Rows per batch (default: 1000).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Compare row counts after copying (default: true).
    #[serde(default = "default_true")]
    pub validate_data: bool,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            drop_existing: false,
            batch_size: default_batch_size(),
            validate_data: true,
        }
    }
}

/// Migration job file: source, target and run options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationFile {
    /// Source adapter configuration.
    pub source: AdapterConfig,

    /// Target adapter configuration.
    pub target: AdapterConfig,

    /// Run options.
    #[serde(default)]
    pub migration: MigrateOptions,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "root".to_string()
}

fn default_database() -> String {
    "travelweb".to_string()
}

fn default_connection_limit() -> usize {
    10
}

fn default_batch_size() -> usize {
    1000
}

fn default_true() -> bool {
    true
}
