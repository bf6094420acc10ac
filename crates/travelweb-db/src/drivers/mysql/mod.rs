//! MySQL/MariaDB adapter.
//!
//! Statements pass through to the server unmodified with positional `?`
//! parameters. Each call borrows a pooled connection that goes back to the
//! pool when it drops, on success and error alike. Transactions pin one
//! connection until commit or rollback.
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod convert;

pub use convert::{mysql_to_sql_value, parse_changed_rows, sql_value_to_mysql, write_result};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row, Transaction, TxOpts};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::AdapterConfig;
use crate::core::{
    ColumnDescriptor, DatabaseAdapter, QueryResult, Record, SqlValue, TransactionGuarantee,
    TransactionHandle,
};
use crate::error::{DbError, Result};

use convert::{row_to_record, to_params};

/// Networked relational adapter over a `mysql_async` pool.
pub struct MysqlAdapter {
    config: AdapterConfig,
    pool: RwLock<Option<Pool>>,
    connected: AtomicBool,
}

impl MysqlAdapter {
    /// Create an adapter. No connection is made until [`connect`](DatabaseAdapter::connect).
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Quote a MySQL identifier.
    pub fn quote_ident(name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn opts(&self) -> Result<Opts> {
        let constraints = PoolConstraints::new(1, self.config.connection_limit.max(1))
            .ok_or_else(|| {
                DbError::Config(format!(
                    "invalid connection_limit {}",
                    self.config.connection_limit
                ))
            })?;

        let builder = OptsBuilder::default()
            .ip_or_hostname(&self.config.host)
            .tcp_port(self.config.port)
            .db_name(Some(&self.config.database))
            .user(Some(&self.config.user))
            .pass(Some(&self.config.password))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"])
            .pool_opts(PoolOpts::new().with_constraints(constraints));

        Ok(builder.into())
    }

    async fn pool(&self) -> Result<Pool> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or_else(|| DbError::not_connected("mysql"))
    }

    async fn conn(&self) -> Result<Conn> {
        self.pool()
            .await?
            .get_conn()
            .await
            .map_err(|e| DbError::connection(e, "acquiring MySQL connection"))
    }

    /// Run a statement returning rows, with the text protocol when there
    /// are no parameters (some admin statements cannot be prepared).
    async fn fetch<Q: Queryable>(conn: &mut Q, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        let rows = if params.is_empty() {
            conn.query::<Row, _>(sql).await
        } else {
            conn.exec::<Row, _, _>(sql, to_params(params)).await
        };
        let rows = rows.map_err(|e| DbError::query(sql, e))?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn strings(&self, sql: &str, params: &[SqlValue], column: &str) -> Result<Vec<String>> {
        let rows = self.query(sql, params).await?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get(column).map(SqlValue::to_text))
            .collect())
    }
}

#[async_trait]
impl DatabaseAdapter for MysqlAdapter {
    async fn connect(&self) -> Result<()> {
        let mut slot = self.pool.write().await;
        if slot.is_some() {
            return Ok(());
        }

        let pool = Pool::new(self.opts()?);

        // Test connection
        let probe = async {
            let mut conn = pool.get_conn().await?;
            conn.query_drop("SELECT 1").await
        };
        if let Err(e) = probe.await {
            pool.disconnect().await.ok();
            return Err(DbError::connection(
                e,
                format!(
                    "connecting to MySQL at {}:{}/{}",
                    self.config.host, self.config.port, self.config.database
                ),
            ));
        }

        info!(
            "Connected to MySQL: {}:{}/{} (pool limit {})",
            self.config.host, self.config.port, self.config.database, self.config.connection_limit
        );
        *slot = Some(pool);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let pool = self.pool.write().await.take();
        self.connected.store(false, Ordering::SeqCst);
        if let Some(pool) = pool {
            pool.disconnect()
                .await
                .map_err(|e| DbError::connection(e, "closing MySQL pool"))?;
            info!("Disconnected from MySQL {}", self.config.database);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn test_connection(&self) -> bool {
        let mut conn = match self.conn().await {
            Ok(conn) => conn,
            Err(e) => {
                debug!("MySQL health check failed: {}", e);
                return false;
            }
        };
        match conn.query_drop("SELECT 1").await {
            Ok(()) => true,
            Err(e) => {
                debug!("MySQL health check failed: {}", e);
                false
            }
        }
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        let mut conn = self.conn().await?;
        Self::fetch(&mut conn, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        let mut conn = self.conn().await?;
        let done = if params.is_empty() {
            conn.query_drop(sql).await
        } else {
            conn.exec_drop(sql, to_params(params)).await
        };
        done.map_err(|e| DbError::query(sql, e))?;

        Ok(write_result(
            conn.affected_rows(),
            conn.last_insert_id(),
            &conn.info(),
        ))
    }

    async fn begin_transaction(&self) -> Result<Arc<dyn TransactionHandle>> {
        let tx = self
            .pool()
            .await?
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| DbError::Transaction(format!("starting MySQL transaction: {}", e)))?;
        Ok(Arc::new(MysqlTransaction {
            tx: Mutex::new(Some(tx)),
        }))
    }

    fn get_type(&self) -> &'static str {
        "mysql"
    }

    fn transaction_guarantee(&self) -> TransactionGuarantee {
        TransactionGuarantee::Serializable
    }

    async fn optimize(&self) -> Result<()> {
        for table in self.list_tables().await? {
            let sql = format!("OPTIMIZE TABLE {}", Self::quote_ident(&table));
            self.query(&sql, &[]).await?;
            debug!("Optimized MySQL table {}", table);
        }
        Ok(())
    }

    async fn check_integrity(&self) -> Result<bool> {
        let mut healthy = true;
        for table in self.list_tables().await? {
            let sql = format!("CHECK TABLE {}", Self::quote_ident(&table));
            for row in self.query(&sql, &[]).await? {
                let msg_type = row.get("Msg_type").map(SqlValue::to_text).unwrap_or_default();
                let msg_text = row.get("Msg_text").map(SqlValue::to_text).unwrap_or_default();
                if msg_type.eq_ignore_ascii_case("status") && !msg_text.eq_ignore_ascii_case("OK") {
                    warn!("CHECK TABLE {}: {}", table, msg_text);
                    healthy = false;
                }
            }
        }
        Ok(healthy)
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.strings(
            "SELECT CAST(TABLE_NAME AS CHAR(255)) AS name
             FROM INFORMATION_SCHEMA.TABLES
             WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
             ORDER BY TABLE_NAME",
            &[SqlValue::from(self.config.database.as_str())],
            "name",
        )
        .await
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows = self
            .query(
                "SELECT
                    CAST(COLUMN_NAME AS CHAR(255)) AS name,
                    CAST(COLUMN_TYPE AS CHAR(1024)) AS native_type,
                    IF(IS_NULLABLE = 'YES', 1, 0) AS is_nullable,
                    COLUMN_DEFAULT AS default_value,
                    IF(COLUMN_KEY = 'PRI', 1, 0) AS is_pk,
                    IF(EXTRA LIKE '%auto_increment%', 1, 0) AS is_identity
                 FROM INFORMATION_SCHEMA.COLUMNS
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
                 ORDER BY ORDINAL_POSITION",
                &[
                    SqlValue::from(self.config.database.as_str()),
                    SqlValue::from(table),
                ],
            )
            .await?;

        if rows.is_empty() {
            return Err(DbError::query(
                format!("describe {}", table),
                format!("table {} not found in {}", table, self.config.database),
            ));
        }

        let flag = |row: &Record, column: &str| row.get(column).and_then(SqlValue::as_i64) == Some(1);
        Ok(rows
            .iter()
            .map(|row| ColumnDescriptor {
                name: row.get("name").map(SqlValue::to_text).unwrap_or_default(),
                native_type: row.get("native_type").map(SqlValue::to_text).unwrap_or_default(),
                nullable: flag(row, "is_nullable"),
                default_value: row
                    .get("default_value")
                    .filter(|v| !v.is_null())
                    .map(SqlValue::to_text),
                is_primary_key: flag(row, "is_pk"),
                auto_increment: flag(row, "is_identity"),
            })
            .collect())
    }

    async fn list_indexes(&self, table: &str) -> Result<Vec<String>> {
        self.strings(
            "SELECT DISTINCT CAST(INDEX_NAME AS CHAR(255)) AS name
             FROM INFORMATION_SCHEMA.STATISTICS
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND INDEX_NAME <> 'PRIMARY'
             ORDER BY name",
            &[
                SqlValue::from(self.config.database.as_str()),
                SqlValue::from(table),
            ],
            "name",
        )
        .await
    }
}

/// Transaction pinned to one pooled connection.
struct MysqlTransaction {
    tx: Mutex<Option<Transaction<'static>>>,
}

impl MysqlTransaction {
    fn finished() -> DbError {
        DbError::Transaction("transaction already committed or rolled back".into())
    }
}

#[async_trait]
impl TransactionHandle for MysqlTransaction {
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(Self::finished)?;
        MysqlAdapter::fetch(tx, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(Self::finished)?;
        let done = if params.is_empty() {
            tx.query_drop(sql).await
        } else {
            tx.exec_drop(sql, to_params(params)).await
        };
        done.map_err(|e| DbError::query(sql, e))?;

        Ok(write_result(
            tx.affected_rows(),
            tx.last_insert_id(),
            &tx.info(),
        ))
    }

    async fn commit(&self) -> Result<()> {
        let tx = self.tx.lock().await.take().ok_or_else(Self::finished)?;
        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("committing MySQL transaction: {}", e)))
    }

    async fn rollback(&self) -> Result<()> {
        let tx = self.tx.lock().await.take().ok_or_else(Self::finished)?;
        tx.rollback()
            .await
            .map_err(|e| DbError::Transaction(format!("rolling back MySQL transaction: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(MysqlAdapter::quote_ident("blogs"), "`blogs`");
        assert_eq!(MysqlAdapter::quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_identity() {
        let adapter = MysqlAdapter::new(AdapterConfig::default());
        assert_eq!(adapter.get_type(), "mysql");
        assert_eq!(
            adapter.transaction_guarantee(),
            TransactionGuarantee::Serializable
        );
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn test_not_connected_errors() {
        let adapter = MysqlAdapter::new(AdapterConfig::default());
        let err = adapter.query("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::NotConnected { .. }));
        assert!(adapter.begin_transaction().await.is_err());
        assert!(!adapter.test_connection().await);
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_ok() {
        let adapter = MysqlAdapter::new(AdapterConfig::default());
        adapter.disconnect().await.unwrap();
        assert!(!adapter.is_connected());
    }
}
