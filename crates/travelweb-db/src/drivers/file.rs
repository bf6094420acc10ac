//! JSON-file adapter.
//!
//! The whole store lives in one JSON document that is loaded on connect and
//! rewritten after every mutating statement (temp file + rename).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{AdapterConfig, BackendKind};
use crate::core::{
    ColumnDescriptor, DatabaseAdapter, QueryResult, Record, SqlValue, TransactionGuarantee,
    TransactionHandle,
};
use crate::error::{DbError, Result};
use crate::store::{Outcome, StoreDocument};

use super::engine::EmbeddedEngine;

/// Default document location when no path is configured.
pub const DEFAULT_FILE_PATH: &str = "data/travelweb.json";

/// Emulated store persisted to a JSON file.
pub struct FileAdapter {
    engine: Arc<EmbeddedEngine>,
}

impl FileAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        let path = config
            .file_path
            .clone()
            .unwrap_or_else(|| DEFAULT_FILE_PATH.into());
        Self {
            engine: Arc::new(EmbeddedEngine::new(
                BackendKind::Json,
                config.strict_statements,
                true,
                Some(path),
            )),
        }
    }

    /// See [`EmulatedAdapter::interpret`](super::EmulatedAdapter::interpret).
    pub async fn interpret(&self, sql: &str, params: &[SqlValue]) -> Result<Outcome> {
        self.engine.interpret(sql, params).await
    }

    fn path(&self) -> Result<&std::path::Path> {
        self.engine
            .file()
            .ok_or_else(|| DbError::Config("json backend has no file path".into()))
    }
}

#[async_trait]
impl DatabaseAdapter for FileAdapter {
    async fn connect(&self) -> Result<()> {
        if self.engine.is_connected() {
            return Ok(());
        }
        let path = self.path()?;

        match StoreDocument::load(path).await {
            Ok(Some(doc)) => {
                info!(
                    "Loaded {} tables from {}",
                    doc.data.len(),
                    path.display()
                );
                self.engine.restore(doc).await;
            }
            Ok(None) => {
                info!("Creating new data file {}", path.display());
                self.engine.persist().await.map_err(|e| {
                    DbError::connection(e, format!("creating {}", path.display()))
                })?;
            }
            Err(e) => {
                return Err(DbError::connection(
                    e,
                    format!("loading {}", path.display()),
                ))
            }
        }

        self.engine.set_connected(true);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.engine.is_connected() {
            self.engine.persist().await?;
        }
        self.engine.set_connected(false);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    async fn test_connection(&self) -> bool {
        self.engine.is_connected()
            && self
                .path()
                .map(|p| p.parent().map_or(true, |dir| dir.as_os_str().is_empty() || dir.exists()))
                .unwrap_or(false)
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
        BackendKind::Json.as_str()
    }

    fn transaction_guarantee(&self) -> TransactionGuarantee {
        TransactionGuarantee::BestEffort
    }

    /// Rewrite the document from memory, which also repairs stale counters.
    async fn optimize(&self) -> Result<()> {
        self.engine.optimize().await
    }

    /// Check the document on disk: it must parse, ids must be unique and
    /// every `nextId` must exceed its table's largest id.
    async fn check_integrity(&self) -> Result<bool> {
        self.engine.ensure_connected()?;
        let path = self.path()?;
        let doc = match StoreDocument::load(path).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                warn!("Integrity check: {} does not exist", path.display());
                return Ok(false);
            }
            Err(e) => {
                warn!("Integrity check: cannot read {}: {}", path.display(), e);
                return Ok(false);
            }
        };

        let problems = doc.integrity_problems();
        for problem in &problems {
            warn!("Integrity check: {}", problem);
        }
        Ok(problems.is_empty())
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
