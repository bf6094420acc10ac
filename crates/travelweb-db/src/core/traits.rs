//! Core traits for the storage adapters.
//!
//! - [`DatabaseAdapter`]: the contract every backend implements
//! - [`TransactionHandle`]: a transaction-scoped query/execute handle
//! - [`AdapterExt`]: the `transaction(work)` template built on top of both
//!
//! Adapters are used as `Arc<dyn DatabaseAdapter>`; everything on the
//! contract is object safe. The generic `transaction` helper lives on the
//! blanket extension trait so it stays callable through a trait object.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

use super::schema::ColumnDescriptor;
use super::value::{QueryResult, Record, SqlValue};

/// Rollback safety a backend actually provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionGuarantee {
    /// Real BEGIN/COMMIT/ROLLBACK on one connection.
    Serializable,
    /// The body runs directly against the store; failures leave partial writes.
    BestEffort,
}

/// Storage backend contract.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Establish the backend resource (pool, in-process maps, file load).
    async fn connect(&self) -> Result<()>;

    /// Release resources; file-backed stores flush pending writes.
    async fn disconnect(&self) -> Result<()>;

    /// Whether `connect` has succeeded and `disconnect` has not been called since.
    fn is_connected(&self) -> bool;

    /// Lightweight liveness probe. Expected failures yield `false`, never an error.
    async fn test_connection(&self) -> bool;

    /// Read path: returns rows in backend order. Must not mutate state.
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>>;

    /// Write path for INSERT/UPDATE/DELETE/DDL.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult>;

    /// Start a transaction and return its handle.
    ///
    /// Prefer [`AdapterExt::transaction`], which commits and rolls back for you.
    async fn begin_transaction(&self) -> Result<Arc<dyn TransactionHandle>>;

    /// Stable backend identity (`mysql`, `sqlite`, `json`, `memory`).
    fn get_type(&self) -> &'static str;

    /// Rollback safety of [`AdapterExt::transaction`] on this backend.
    fn transaction_guarantee(&self) -> TransactionGuarantee;

    /// Best-effort storage maintenance.
    async fn optimize(&self) -> Result<()> {
        Ok(())
    }

    /// Best-effort consistency check.
    async fn check_integrity(&self) -> Result<bool> {
        Ok(true)
    }

    /// Names of the user tables, sorted.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Column metadata for a table in this backend's native types.
    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;

    /// Secondary index names for a table.
    async fn list_indexes(&self, _table: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Check if a table exists.
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.list_tables().await?.iter().any(|t| t == table))
    }
}

/// Transaction-scoped handle handed to transaction bodies.
#[async_trait]
pub trait TransactionHandle: Send + Sync {
    /// Read within the transaction.
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>>;

    /// Write within the transaction.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult>;

    /// Make the transaction's writes durable.
    async fn commit(&self) -> Result<()>;

    /// Discard the transaction's writes (no-op on best-effort backends).
    async fn rollback(&self) -> Result<()>;
}

/// Transaction template available on every adapter, including trait objects.
pub trait AdapterExt {
    /// Run `work` against a transaction handle: commit on `Ok`, roll back
    /// and return the original error on `Err`.
    fn transaction<T, F, Fut>(&self, work: F) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        F: FnOnce(Arc<dyn TransactionHandle>) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send;
}

impl<A: DatabaseAdapter + ?Sized> AdapterExt for A {
    fn transaction<T, F, Fut>(&self, work: F) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        F: FnOnce(Arc<dyn TransactionHandle>) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        async move {
            let tx = self.begin_transaction().await?;
            match work(tx.clone()).await {
                Ok(value) => {
                    tx.commit().await?;
                    Ok(value)
                }
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(
                            "{} rollback failed after error '{}': {}",
                            self.get_type(),
                            e,
                            rollback_err
                        );
                    }
                    Err(e)
                }
            }
        }
    }
}
