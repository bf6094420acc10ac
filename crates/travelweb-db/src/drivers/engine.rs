//! Statement engine shared by the in-process adapters.
//!
//! Parses SQL, runs it against a [`TableStore`] behind a `tokio::sync::RwLock`
//! and, when backed by a file, rewrites the whole document after every
//! mutating statement while still holding the write lock.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::BackendKind;
use crate::core::{ColumnDescriptor, QueryResult, Record, SqlValue, TransactionHandle};
use crate::error::{DbError, Result};
use crate::sql::parse;
use crate::store::{Outcome, StoreDocument, TableStore};

pub(crate) struct EmbeddedEngine {
    kind: BackendKind,
    strict: bool,
    track_schema: bool,
    file: Option<PathBuf>,
    store: RwLock<TableStore>,
    connected: AtomicBool,
}

impl EmbeddedEngine {
    pub fn new(kind: BackendKind, strict: bool, track_schema: bool, file: Option<PathBuf>) -> Self {
        Self {
            kind,
            strict,
            track_schema,
            file,
            store: RwLock::new(TableStore::new(track_schema)),
            connected: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DbError::not_connected(self.kind.as_str()))
        }
    }

    /// Replace the store with the contents of a loaded document.
    pub async fn restore(&self, doc: StoreDocument) {
        *self.store.write().await = TableStore::from_document(doc, self.track_schema);
    }

    /// Rewrite the backing file from memory. Refuses to run before
    /// `connect`, when the store has not been loaded yet.
    pub async fn optimize(&self) -> Result<()> {
        self.ensure_connected()?;
        self.persist().await
    }

    /// Consistency problems of the in-memory store.
    pub async fn integrity_problems(&self) -> Result<Vec<String>> {
        self.ensure_connected()?;
        Ok(self.store.read().await.to_document().integrity_problems())
    }

    /// Write the current store to the backing file, if any.
    pub async fn persist(&self) -> Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        let doc = self.store.read().await.to_document();
        doc.save(path).await
    }

    /// Interpret a statement and return the tagged outcome.
    pub async fn interpret(&self, sql: &str, params: &[SqlValue]) -> Result<Outcome> {
        self.ensure_connected()?;
        let stmt = match parse(sql) {
            Ok(stmt) => stmt,
            Err(e) => return Ok(Outcome::Unsupported(e.to_string())),
        };

        if !stmt.is_mutation() {
            return self.store.read().await.evaluate(&stmt, params);
        }

        let mut store = self.store.write().await;
        let outcome = store.apply(&stmt, params)?;
        if let (Outcome::Write(_), Some(path)) = (&outcome, &self.file) {
            store.to_document().save(path).await?;
        }
        Ok(outcome)
    }

    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        match self.interpret_read(sql, params).await? {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Write(_) => Ok(Vec::new()),
            Outcome::Unsupported(reason) => self.unsupported(sql, &reason, Vec::new()),
        }
    }

    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        match self.interpret(sql, params).await? {
            Outcome::Write(result) => Ok(result),
            Outcome::Rows(_) => self.unsupported(
                sql,
                "reads must go through query",
                QueryResult::default(),
            ),
            Outcome::Unsupported(reason) => self.unsupported(sql, &reason, QueryResult::default()),
        }
    }

    /// Read path: never takes the write lock.
    async fn interpret_read(&self, sql: &str, params: &[SqlValue]) -> Result<Outcome> {
        self.ensure_connected()?;
        match parse(sql) {
            Ok(stmt) => self.store.read().await.evaluate(&stmt, params),
            Err(e) => Ok(Outcome::Unsupported(e.to_string())),
        }
    }

    fn unsupported<T>(&self, sql: &str, reason: &str, empty: T) -> Result<T> {
        let sql = sql.trim();
        if self.strict {
            return Err(DbError::Unsupported(format!("{}: {}", reason, sql)));
        }
        debug!(
            "{}: unsupported statement, returning empty result ({}): {}",
            self.kind, reason, sql
        );
        Ok(empty)
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.ensure_connected()?;
        Ok(self.store.read().await.table_names())
    }

    pub async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        self.ensure_connected()?;
        self.store.read().await.describe(table).ok_or_else(|| {
            DbError::query(format!("describe {}", table), format!("no such table: {}", table))
        })
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        self.ensure_connected()?;
        Ok(self.store.read().await.contains(table))
    }

    pub fn begin(self: &Arc<Self>) -> Result<Arc<dyn TransactionHandle>> {
        self.ensure_connected()?;
        Ok(Arc::new(EmbeddedTransaction {
            engine: Arc::clone(self),
        }))
    }
}

/// Best-effort transaction: statements apply immediately, rollback only warns.
struct EmbeddedTransaction {
    engine: Arc<EmbeddedEngine>,
}

#[async_trait]
impl TransactionHandle for EmbeddedTransaction {
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        self.engine.query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        self.engine.execute(sql, params).await
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        warn!(
            "{} transactions are best-effort; writes made before the failure were kept",
            self.engine.kind()
        );
        Ok(())
    }
}
