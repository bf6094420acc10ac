//! Pure in-memory adapter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{AdapterConfig, BackendKind};
use crate::core::{
    ColumnDescriptor, DatabaseAdapter, QueryResult, Record, SqlValue, TransactionGuarantee,
    TransactionHandle,
};
use crate::error::Result;
use crate::store::Outcome;

use super::engine::EmbeddedEngine;

/// In-memory store without schema metadata. CREATE TABLE only creates an
/// empty collection; columns are inferred from stored records.
pub struct MemoryAdapter {
    engine: Arc<EmbeddedEngine>,
}

impl MemoryAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            engine: Arc::new(EmbeddedEngine::new(
                BackendKind::Memory,
                config.strict_statements,
                false,
                None,
            )),
        }
    }

    /// See [`EmulatedAdapter::interpret`](super::EmulatedAdapter::interpret).
    pub async fn interpret(&self, sql: &str, params: &[SqlValue]) -> Result<Outcome> {
        self.engine.interpret(sql, params).await
    }
}

#[async_trait]
impl DatabaseAdapter for MemoryAdapter {
    async fn connect(&self) -> Result<()> {
        self.engine.set_connected(true);
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
        self.engine.is_connected()
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
        BackendKind::Memory.as_str()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_schema_metadata() {
        let adapter = MemoryAdapter::new(&AdapterConfig::for_kind(BackendKind::Memory));
        adapter.connect().await.unwrap();
        adapter
            .execute("CREATE TABLE videos (id INTEGER PRIMARY KEY, title TEXT)", &[])
            .await
            .unwrap();
        assert!(adapter.table_exists("videos").await.unwrap());
        assert!(adapter.describe_table("videos").await.unwrap().is_empty());

        adapter
            .execute(
                "INSERT INTO videos (title, duration) VALUES (?, ?)",
                &["Fjords".into(), SqlValue::Int(300)],
            )
            .await
            .unwrap();
        let names: Vec<String> = adapter
            .describe_table("videos")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            vec!["id", "title", "duration", "created_at", "updated_at"]
        );
        assert_eq!(adapter.get_type(), "memory");
    }

    #[tokio::test]
    async fn test_describe_missing_table_errors() {
        let adapter = MemoryAdapter::new(&AdapterConfig::for_kind(BackendKind::Memory));
        adapter.connect().await.unwrap();
        assert!(adapter.describe_table("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_and_update_counts() {
        let adapter = MemoryAdapter::new(&AdapterConfig::for_kind(BackendKind::Memory));
        adapter.connect().await.unwrap();
        for title in ["a", "b", "c"] {
            adapter
                .execute("INSERT INTO blogs (title) VALUES (?)", &[title.into()])
                .await
                .unwrap();
        }
        let updated = adapter
            .execute(
                "UPDATE blogs SET title = ? WHERE id = ?",
                &["B".into(), SqlValue::Int(2)],
            )
            .await
            .unwrap();
        assert_eq!(updated.affected_rows, 1);
        let deleted = adapter
            .execute("DELETE FROM blogs WHERE id = ?", &["3".into()])
            .await
            .unwrap();
        assert_eq!(deleted.affected_rows, 1);
        let count = adapter
            .query("SELECT COUNT(*) AS n FROM blogs", &[])
            .await
            .unwrap();
        assert_eq!(count[0].get("n"), Some(&SqlValue::Int(2)));
    }

    #[tokio::test]
    async fn test_maintenance_requires_connect() {
        let adapter = MemoryAdapter::new(&AdapterConfig::for_kind(BackendKind::Memory));
        assert!(matches!(
            adapter.optimize().await,
            Err(crate::error::DbError::NotConnected { .. })
        ));
        assert!(matches!(
            adapter.check_integrity().await,
            Err(crate::error::DbError::NotConnected { .. })
        ));

        adapter.connect().await.unwrap();
        adapter.optimize().await.unwrap();
        assert!(adapter.check_integrity().await.unwrap());
    }
}
