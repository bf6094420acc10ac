//! Core abstractions shared by every backend.
//!
//! - [`schema`]: column and table metadata
//! - [`value`]: SQL values, records and write results
//! - [`traits`]: the adapter contract and transaction template

pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{ColumnDescriptor, TableDefinition};
pub use traits::{AdapterExt, DatabaseAdapter, TransactionGuarantee, TransactionHandle};
pub use value::{QueryResult, Record, SqlValue};
