//! Error types for the data-access layer.

use thiserror::Error;

/// Main error type for adapter, registry and migration operations.
#[derive(Error, Debug)]
pub enum DbError {
    /// Configuration error (invalid YAML, missing fields, bad backend kind, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation attempted on an adapter that is not connected
    #[error("{backend} adapter is not connected")]
    NotConnected { backend: String },

    /// Connection or pool error with context
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Statement failed on the backend
    #[error("Query failed: {message}\n  Statement: {statement}")]
    Query { statement: String, message: String },

    /// Statement outside the supported grammar (strict mode only)
    #[error("Unsupported statement: {0}")]
    Unsupported(String),

    /// Transaction could not be started, committed or rolled back
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Migration failed for a specific table
    #[error("Migration failed for table {table}: {message}")]
    Migration { table: String, message: String },

    /// Row count validation failed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// MySQL driver error
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        DbError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Query error
    pub fn query(statement: impl Into<String>, message: impl ToString) -> Self {
        DbError::Query {
            statement: statement.into(),
            message: message.to_string(),
        }
    }

    /// Create a Migration error
    pub fn migration(table: impl Into<String>, message: impl Into<String>) -> Self {
        DbError::Migration {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a NotConnected error for the given backend type
    pub fn not_connected(backend: impl Into<String>) -> Self {
        DbError::NotConnected {
            backend: backend.into(),
        }
    }

    /// Process exit code for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            DbError::Config(_) | DbError::Yaml(_) => 2,
            DbError::Connection { .. } | DbError::NotConnected { .. } | DbError::Mysql(_) => 3,
            DbError::Migration { .. } | DbError::Validation(_) => 4,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for data-access operations.
pub type Result<T> = std::result::Result<T, DbError>;
