//! # travelweb-db
//!
//! Data-access layer for the travelweb site.
//!
//! One adapter contract ([`DatabaseAdapter`]) with four backends:
//!
//! - **MySQL** over a bounded `mysql_async` pool
//! - **SQLite-style** embedded store driven by a small SQL interpreter
//! - **JSON file** store that persists the whole document on every write
//! - **In-memory** store for tests and throwaway sessions
//!
//! Adapters are obtained through an [`AdapterRegistry`] (one instance per
//! configuration) or the application-level [`DatabaseManager`]. The
//! [`Migrator`] copies tables between any two backends, mapping column
//! types through [`typemap`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use travelweb_db::{AdapterConfig, BackendKind, DatabaseManager};
//!
//! #[tokio::main]
//! async fn main() -> travelweb_db::Result<()> {
//!     let manager = DatabaseManager::new();
//!     manager
//!         .initialize(Some(AdapterConfig::for_kind(BackendKind::Memory)))
//!         .await?;
//!     manager.create_tables().await?;
//!     manager.insert_sample_data().await?;
//!
//!     let db = manager.adapter().await?;
//!     let blogs = db.query("SELECT * FROM blogs ORDER BY id LIMIT 10", &[]).await?;
//!     println!("{} blogs", blogs.len());
//!     manager.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod manager;
pub mod migrate;
pub mod registry;
pub mod sql;
pub mod store;
pub mod typemap;

// Re-exports for convenient access
pub use config::{AdapterConfig, BackendKind, Dialect, MigrateOptions, MigrationFile};
pub use core::{
    AdapterExt, ColumnDescriptor, DatabaseAdapter, QueryResult, Record, SqlValue,
    TableDefinition, TransactionGuarantee, TransactionHandle,
};
pub use drivers::{EmulatedAdapter, FileAdapter, MemoryAdapter, MysqlAdapter};
pub use error::{DbError, Result};
pub use manager::{DatabaseManager, DatabaseStatus};
pub use migrate::{MigrationLog, MigrationResult, Migrator, TableSummary};
pub use registry::{build_adapter, AdapterRegistry};
