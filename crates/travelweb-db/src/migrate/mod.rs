//! Table-by-table data migration between two adapters.
//!
//! Each run discovers the source tables, then for every table describes its
//! structure, creates the target table, copies rows in batches and
//! validates row counts. A failing table is recorded and skipped; the run
//! carries on with the next one.

pub mod log;
pub mod normalize;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::{AdapterConfig, BackendKind, Dialect, MigrateOptions, MigrationFile};
use crate::core::{AdapterExt, DatabaseAdapter, SqlValue};
use crate::error::{DbError, Result};
use crate::manager::schema::insert_sql;
use crate::registry::AdapterRegistry;
use crate::typemap::{build_create_table, mapper_for, quote_ident};

pub use log::{LogEntry, LogLevel, MigrationLog};
pub use normalize::normalize_value;

/// Per-table outcome of a successful copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: u64,
    pub batch_sizes: Vec<usize>,
    pub validated: bool,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    pub run_id: String,
    pub success: bool,
    /// Tables migrated without error.
    pub tables_processed: usize,
    pub records_migrated: u64,
    /// One `"<table>: <message>"` line per failed table.
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
    pub tables: Vec<TableSummary>,
}

impl MigrationResult {
    /// Convert result to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Drives one source adapter into one target adapter.
pub struct Migrator {
    source: Arc<dyn DatabaseAdapter>,
    target: Arc<dyn DatabaseAdapter>,
    source_dialect: Dialect,
    target_dialect: Dialect,
    config_hash: Option<String>,
    log: MigrationLog,
}

impl Migrator {
    /// Obtain and connect both adapters through `registry`.
    pub async fn initialize(
        registry: &AdapterRegistry,
        source: &AdapterConfig,
        target: &AdapterConfig,
    ) -> Result<Self> {
        if source.cache_key() == target.cache_key() {
            return Err(DbError::Config(
                "source and target must be different databases".into(),
            ));
        }
        let source = registry.create_adapter(source).await?;
        let target = registry.create_adapter(target).await?;
        Self::with_adapters(source, target)
    }

    /// Build from a migration job file, recording its hash in the log.
    pub async fn from_file(registry: &AdapterRegistry, file: &MigrationFile) -> Result<Self> {
        let migrator = Self::initialize(registry, &file.source, &file.target).await?;
        Ok(migrator.with_config_hash(file.hash()))
    }

    /// Use already connected adapters.
    pub fn with_adapters(
        source: Arc<dyn DatabaseAdapter>,
        target: Arc<dyn DatabaseAdapter>,
    ) -> Result<Self> {
        let source_dialect = source.get_type().parse::<BackendKind>()?.dialect();
        let target_dialect = target.get_type().parse::<BackendKind>()?.dialect();
        Ok(Self {
            source,
            target,
            source_dialect,
            target_dialect,
            config_hash: None,
            log: MigrationLog::new(),
        })
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn log(&self) -> &MigrationLog {
        &self.log
    }

    pub async fn save_log(&self, path: &Path) -> Result<()> {
        self.log.save(path).await
    }

    /// Run the migration.
    pub async fn migrate(&mut self, options: &MigrateOptions) -> Result<MigrationResult> {
        if options.batch_size == 0 {
            return Err(DbError::Config("batch_size must be at least 1".into()));
        }

        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut result = MigrationResult {
            run_id: run_id.clone(),
            success: false,
            tables_processed: 0,
            records_migrated: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            duration_ms: 0,
            tables: Vec::new(),
        };

        self.log.info(format!("Starting migration run: {}", run_id));
        self.log.info(format!(
            "Source: {}, target: {}",
            self.source.get_type(),
            self.target.get_type()
        ));
        if let Some(hash) = &self.config_hash {
            self.log.info(format!("Config hash: {}", hash));
        }

        let tables = match self.discover(options, &mut result).await {
            Ok(tables) => tables,
            Err(e) => {
                let message = format!("discover: {}", e);
                self.log.error(&message);
                result.errors.push(message);
                return Ok(self.finish(result, start));
            }
        };
        self.log.info(format!("Found {} tables to migrate", tables.len()));

        for table in &tables {
            match self.migrate_table(table, options, &mut result.warnings).await {
                Ok(summary) => {
                    result.tables_processed += 1;
                    result.records_migrated += summary.rows;
                    result.tables.push(summary);
                }
                Err(e) => {
                    let message = format!("{}: {}", table, e);
                    self.log.error(&message);
                    result.errors.push(message);
                }
            }
        }

        Ok(self.finish(result, start))
    }

    fn finish(&mut self, mut result: MigrationResult, start: Instant) -> MigrationResult {
        result.duration_ms = start.elapsed().as_millis() as u64;
        result.success = result.errors.is_empty();
        let message = format!(
            "Migration {}: {}/{} tables, {} rows in {} ms",
            if result.success { "completed" } else { "finished with errors" },
            result.tables_processed,
            result.tables_processed + result.errors.len(),
            result.records_migrated,
            result.duration_ms
        );
        if result.success {
            self.log.info(message);
        } else {
            self.log.warn(message);
        }
        result
    }

    async fn discover(
        &mut self,
        options: &MigrateOptions,
        result: &mut MigrationResult,
    ) -> Result<Vec<String>> {
        let available = self.source.list_tables().await?;
        if options.tables.is_empty() {
            return Ok(available);
        }

        let mut selected = Vec::new();
        for name in &options.tables {
            if available.contains(name) {
                selected.push(name.clone());
            } else {
                let message = format!("{}: table not found in source", name);
                self.log.error(&message);
                result.errors.push(message);
            }
        }
        Ok(selected)
    }

    async fn migrate_table(
        &mut self,
        table: &str,
        options: &MigrateOptions,
        warnings: &mut Vec<String>,
    ) -> Result<TableSummary> {
        self.log.info(format!("Migrating table {}", table));

        // Describe
        let columns = self.source.describe_table(table).await?;
        if columns.is_empty() {
            return Err(DbError::migration(table, "source reports no columns"));
        }
        let mapper = mapper_for(self.source_dialect, self.target_dialect);
        let mapped: Vec<_> = columns.iter().map(|c| mapper.map_column(c)).collect();
        for column in &mapped {
            if let Some(warning) = &column.warning {
                self.warn(warnings, format!("{}.{}: {}", table, column.name, warning));
            }
        }
        let primary_key: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();
        match self.source.list_indexes(table).await {
            Ok(indexes) if !indexes.is_empty() => self.warn(
                warnings,
                format!(
                    "{}: secondary indexes not recreated: {}",
                    table,
                    indexes.join(", ")
                ),
            ),
            Ok(_) => {}
            Err(e) => self.warn(warnings, format!("{}: could not list indexes: {}", table, e)),
        }

        // CreateTarget
        let target_table = quote_ident(self.target_dialect, table);
        let exists = self.target.table_exists(table).await?;
        if exists && options.drop_existing {
            self.target
                .execute(&format!("DROP TABLE IF EXISTS {}", target_table), &[])
                .await?;
            self.log.info(format!("Dropped existing target table {}", table));
        }
        if exists && !options.drop_existing {
            self.warn(
                warnings,
                format!("{}: target table already exists, skipping creation", table),
            );
        } else {
            let ddl = build_create_table(self.target_dialect, table, &mapped, &primary_key);
            self.target.execute(&ddl, &[]).await?;
            self.log.info(format!("Created target table {}", table));
        }

        // CopyBatched
        let total = count_rows(self.source.as_ref(), self.source_dialect, table).await?;
        let source_table = quote_ident(self.source_dialect, table);
        let order_by = primary_key
            .first()
            .map(|pk| format!(" ORDER BY {}", quote_ident(self.source_dialect, pk)))
            .unwrap_or_default();
        let target_dialect = self.target_dialect;

        let mut batch_sizes = Vec::new();
        let mut copied = 0u64;
        let mut offset = 0u64;
        while offset < total {
            let page = format!(
                "SELECT * FROM {}{} LIMIT {} OFFSET {}",
                source_table, order_by, options.batch_size, offset
            );
            let rows = self.source.query(&page, &[]).await?;
            if rows.is_empty() {
                break;
            }
            let batch_len = rows.len();

            let inserted = self
                .target
                .transaction(|tx| async move {
                    let mut inserted = 0u64;
                    for row in &rows {
                        let params: Vec<SqlValue> =
                            row.values().cloned().map(normalize_value).collect();
                        tx.execute(&insert_sql(target_dialect, table, row), &params)
                            .await?;
                        inserted += 1;
                    }
                    Ok::<_, DbError>(inserted)
                })
                .await?;

            batch_sizes.push(batch_len);
            copied += inserted;
            offset += options.batch_size as u64;
            let pct = copied as f64 / total as f64 * 100.0;
            self.log.info(format!(
                "{}: {}/{} rows ({:.0}%)",
                table, copied, total, pct
            ));
        }

        // Validate
        if options.validate_data {
            let target_count =
                count_rows(self.target.as_ref(), self.target_dialect, table).await?;
            if target_count != total {
                return Err(DbError::Validation(format!(
                    "row count mismatch: source={} target={}",
                    total, target_count
                )));
            }
            self.log.info(format!("{}: {} rows (match)", table, total));
        }

        Ok(TableSummary {
            name: table.to_string(),
            rows: copied,
            batch_sizes,
            validated: options.validate_data,
        })
    }

    fn warn(&mut self, warnings: &mut Vec<String>, message: String) {
        self.log.warn(&message);
        warnings.push(message);
    }
}

async fn count_rows(adapter: &dyn DatabaseAdapter, dialect: Dialect, table: &str) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) AS count FROM {}", quote_ident(dialect, table));
    let rows = adapter.query(&sql, &[]).await?;
    rows.first()
        .and_then(|r| r.get("count"))
        .and_then(SqlValue::as_i64)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| DbError::query(sql, "COUNT(*) returned no value"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ColumnDescriptor, QueryResult, Record, TransactionGuarantee, TransactionHandle};
    use crate::drivers::{EmulatedAdapter, MemoryAdapter};
    use async_trait::async_trait;

    async fn emulated() -> Arc<dyn DatabaseAdapter> {
        let adapter = EmulatedAdapter::new(&AdapterConfig::for_kind(BackendKind::Sqlite));
        adapter.connect().await.unwrap();
        Arc::new(adapter)
    }

    async fn memory() -> Arc<dyn DatabaseAdapter> {
        let adapter = MemoryAdapter::new(&AdapterConfig::for_kind(BackendKind::Memory));
        adapter.connect().await.unwrap();
        Arc::new(adapter)
    }

    async fn seed(adapter: &dyn DatabaseAdapter, table: &str, rows: usize) {
        adapter
            .execute(
                &format!(
                    "CREATE TABLE {} (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, published INTEGER)",
                    table
                ),
                &[],
            )
            .await
            .unwrap();
        for i in 0..rows {
            adapter
                .execute(
                    &format!("INSERT INTO {} (title, published) VALUES (?, ?)", table),
                    &[format!("{} {}", table, i + 1).into(), (i % 2 == 0).into()],
                )
                .await
                .unwrap();
        }
    }

    async fn count(adapter: &dyn DatabaseAdapter, table: &str) -> i64 {
        adapter
            .query(&format!("SELECT COUNT(*) AS n FROM {}", table), &[])
            .await
            .unwrap()[0]
            .get("n")
            .and_then(SqlValue::as_i64)
            .unwrap()
    }

    #[tokio::test]
    async fn test_blogs_in_two_batches() {
        let source = emulated().await;
        seed(source.as_ref(), "blogs", 3).await;
        let target = memory().await;

        let mut migrator = Migrator::with_adapters(source, Arc::clone(&target)).unwrap();
        let options = MigrateOptions {
            batch_size: 2,
            ..Default::default()
        };
        let result = migrator.migrate(&options).await.unwrap();

        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.records_migrated, 3);
        assert_eq!(result.tables_processed, 1);
        assert_eq!(result.tables[0].batch_sizes, vec![2, 1]);
        assert!(result.tables[0].validated);
        assert_eq!(count(target.as_ref(), "blogs").await, 3);

        let copied = target
            .query("SELECT * FROM blogs WHERE id = ?", &[3.into()])
            .await
            .unwrap();
        assert_eq!(copied[0].get("title"), Some(&SqlValue::Text("blogs 3".into())));
        // Booleans arrive as 0/1.
        assert_eq!(copied[0].get("published"), Some(&SqlValue::Int(1)));
    }

    #[tokio::test]
    async fn test_round_trip_with_subset_and_missing_table() {
        let source = emulated().await;
        seed(source.as_ref(), "blogs", 25).await;
        seed(source.as_ref(), "videos", 4).await;
        let target = emulated().await;

        let mut migrator = Migrator::with_adapters(source, Arc::clone(&target)).unwrap();
        let options = MigrateOptions {
            tables: vec!["blogs".into(), "photos".into()],
            batch_size: 10,
            ..Default::default()
        };
        let result = migrator.migrate(&options).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.errors, vec!["photos: table not found in source".to_string()]);
        assert_eq!(result.tables_processed, 1);
        assert_eq!(result.tables[0].batch_sizes, vec![10, 10, 5]);
        assert_eq!(count(target.as_ref(), "blogs").await, 25);
        assert!(!target.table_exists("videos").await.unwrap());

        let columns = target.describe_table("blogs").await.unwrap();
        assert!(columns[0].is_primary_key);
        assert!(!columns[1].nullable);
    }

    #[tokio::test]
    async fn test_existing_target_table() {
        let source = emulated().await;
        seed(source.as_ref(), "blogs", 2).await;
        let target = emulated().await;
        seed(target.as_ref(), "blogs", 5).await;

        let mut migrator = Migrator::with_adapters(Arc::clone(&source), Arc::clone(&target)).unwrap();
        let result = migrator.migrate(&MigrateOptions::default()).await.unwrap();
        // Copying into the populated table collides on id 1.
        assert!(!result.success);
        assert!(result.errors[0].starts_with("blogs: "));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("already exists")));

        let options = MigrateOptions {
            drop_existing: true,
            ..Default::default()
        };
        let mut migrator = Migrator::with_adapters(source, Arc::clone(&target)).unwrap();
        let result = migrator.migrate(&options).await.unwrap();
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(count(target.as_ref(), "blogs").await, 2);
    }

    #[tokio::test]
    async fn test_empty_table_has_no_batches() {
        let source = emulated().await;
        seed(source.as_ref(), "videos", 0).await;
        let mut migrator = Migrator::with_adapters(source, memory().await).unwrap();
        let result = migrator.migrate(&MigrateOptions::default()).await.unwrap();
        assert!(result.success);
        assert!(result.tables[0].batch_sizes.is_empty());
        assert_eq!(result.records_migrated, 0);
    }

    /// Delegates to an inner adapter but fails to describe one table.
    struct BrokenDescribe {
        inner: Arc<dyn DatabaseAdapter>,
        broken: &'static str,
    }

    #[async_trait]
    impl DatabaseAdapter for BrokenDescribe {
        async fn connect(&self) -> Result<()> {
            self.inner.connect().await
        }
        async fn disconnect(&self) -> Result<()> {
            self.inner.disconnect().await
        }
        fn is_connected(&self) -> bool {
            self.inner.is_connected()
        }
        async fn test_connection(&self) -> bool {
            self.inner.test_connection().await
        }
        async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
            self.inner.query(sql, params).await
        }
        async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
            self.inner.execute(sql, params).await
        }
        async fn begin_transaction(&self) -> Result<Arc<dyn TransactionHandle>> {
            self.inner.begin_transaction().await
        }
        fn get_type(&self) -> &'static str {
            self.inner.get_type()
        }
        fn transaction_guarantee(&self) -> TransactionGuarantee {
            self.inner.transaction_guarantee()
        }
        async fn list_tables(&self) -> Result<Vec<String>> {
            self.inner.list_tables().await
        }
        async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
            if table == self.broken {
                return Err(DbError::query(format!("PRAGMA table_info({})", table), "disk I/O error"));
            }
            self.inner.describe_table(table).await
        }
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_table() {
        let inner = emulated().await;
        seed(inner.as_ref(), "a_posts", 3).await;
        seed(inner.as_ref(), "b_photos", 2).await;
        seed(inner.as_ref(), "c_videos", 4).await;
        let source: Arc<dyn DatabaseAdapter> = Arc::new(BrokenDescribe {
            inner,
            broken: "b_photos",
        });
        let target = memory().await;

        let mut migrator = Migrator::with_adapters(source, Arc::clone(&target)).unwrap();
        let result = migrator.migrate(&MigrateOptions::default()).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("b_photos: "));
        assert!(result.errors[0].contains("disk I/O error"));
        assert_eq!(result.tables_processed, 2);
        assert_eq!(result.records_migrated, 7);
        let names: Vec<_> = result.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a_posts", "c_videos"]);

        assert!(migrator
            .log()
            .entries()
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.starts_with("b_photos")));
    }

    #[tokio::test]
    async fn test_initialize_rejects_same_database() {
        let registry = AdapterRegistry::new();
        let config = AdapterConfig::for_kind(BackendKind::Memory);
        assert!(matches!(
            Migrator::initialize(&registry, &config, &config).await,
            Err(DbError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_result_json_and_saved_log() {
        let source = emulated().await;
        seed(source.as_ref(), "blogs", 1).await;
        let mut migrator = Migrator::with_adapters(source, memory().await)
            .unwrap()
            .with_config_hash("abc123");
        let result = migrator.migrate(&MigrateOptions::default()).await.unwrap();

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["records_migrated"], 1);
        assert_eq!(json["success"], true);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration.json");
        migrator.save_log(&path).await.unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("Config hash: abc123"));
        assert!(saved.contains(&result.run_id));
    }
}
