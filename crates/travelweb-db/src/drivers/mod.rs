//! Backend implementations of [`DatabaseAdapter`](crate::core::DatabaseAdapter).
//!
//! - [`mysql`]: networked MySQL/MariaDB over a connection pool
//! - [`EmulatedAdapter`]: in-process SQLite-like store
//! - [`FileAdapter`]: the emulated store persisted to one JSON document
//! - [`MemoryAdapter`]: in-process store without schema metadata
//!
//! The three in-process backends share one statement engine and differ only
//! in persistence and schema tracking.
//!
//! # Adding New Backends
//!
//! 1. Create a module under `drivers/` implementing `DatabaseAdapter`
//! 2. Add a `BackendKind` variant and its aliases
//! 3. Construct it in `registry::build_adapter`

mod emulated;
mod engine;
mod file;
mod memory;
pub mod mysql;

pub use emulated::EmulatedAdapter;
pub use file::{FileAdapter, DEFAULT_FILE_PATH};
pub use memory::MemoryAdapter;
pub use mysql::MysqlAdapter;
