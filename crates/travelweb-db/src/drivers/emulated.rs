//! SQLite-like adapter backed by the in-process table store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{AdapterConfig, BackendKind};
use crate::core::{
    ColumnDescriptor, DatabaseAdapter, QueryResult, Record, SqlValue, TransactionGuarantee,
    TransactionHandle,
};
use crate::error::Result;
use crate::store::Outcome;

use super::engine::EmbeddedEngine;

/// Emulated relational store. Declared columns are recorded for
/// introspection but never enforced.
pub struct EmulatedAdapter {
    engine: Arc<EmbeddedEngine>,
}

impl EmulatedAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            engine: Arc::new(EmbeddedEngine::new(
                BackendKind::Sqlite,
                config.strict_statements,
                true,
                None,
            )),
        }
    }

    /// Interpret a statement, returning unsupported statements as a tagged
    /// outcome instead of an empty result.
    pub async fn interpret(&self, sql: &str, params: &[SqlValue]) -> Result<Outcome> {
        self.engine.interpret(sql, params).await
    }
}

#[async_trait]
impl DatabaseAdapter for EmulatedAdapter {
    async fn connect(&self) -> Result<()> {
        if !self.engine.is_connected() {
            self.engine.set_connected(true);
            info!("Emulated relational store ready");
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.engine.set_connected(false);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    async fn test_connection(&self) -> bool {
        self.engine.query("SELECT COUNT(*) FROM sqlite_master", &[]).await.is_ok()
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        self.engine.query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        self.engine.execute(sql, params).await
    }

    async fn begin_transaction(&self) -> Result<Arc<dyn TransactionHandle>> {
        self.engine.begin()
    }

    fn get_type(&self) -> &'static str {
        BackendKind::Sqlite.as_str()
    }

    fn transaction_guarantee(&self) -> TransactionGuarantee {
        TransactionGuarantee::BestEffort
    }

    async fn optimize(&self) -> Result<()> {
        self.engine.optimize().await
    }

    async fn check_integrity(&self) -> Result<bool> {
        Ok(self.engine.integrity_problems().await?.is_empty())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.engine.list_tables().await
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        self.engine.describe_table(table).await
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.engine.table_exists(table).await
    }
}
