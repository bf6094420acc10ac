//! Application-facing database manager.
//!
//! Owns an [`AdapterRegistry`] and the adapter the site currently talks to,
//! and bootstraps the site schema on it.

pub mod schema;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{AdapterConfig, BackendKind, Dialect};
use crate::core::{DatabaseAdapter, SqlValue};
use crate::error::{DbError, Result};
use crate::registry::AdapterRegistry;

/// Snapshot of the manager's current adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
    pub backend_kind: Option<BackendKind>,
    /// Current configuration with the password redacted.
    pub config: Option<AdapterConfig>,
}

struct Current {
    config: AdapterConfig,
    adapter: Arc<dyn DatabaseAdapter>,
}

/// Holds at most one current adapter.
#[derive(Default)]
pub struct DatabaseManager {
    registry: AdapterRegistry,
    current: RwLock<Option<Current>>,
}

impl DatabaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect the current adapter, from `config` or from the environment.
    pub async fn initialize(&self, config: Option<AdapterConfig>) -> Result<Arc<dyn DatabaseAdapter>> {
        let config = match config {
            Some(config) => config,
            None => AdapterConfig::from_env()?,
        };
        self.switch_database(config).await
    }

    /// The current adapter.
    pub async fn adapter(&self) -> Result<Arc<dyn DatabaseAdapter>> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|c| Arc::clone(&c.adapter))
            .ok_or_else(|| DbError::not_connected("manager"))
    }

    /// Make `config` the current database.
    ///
    /// The new adapter is connected before the old one is released, so a
    /// failed switch leaves the previous adapter in place.
    pub async fn switch_database(&self, config: AdapterConfig) -> Result<Arc<dyn DatabaseAdapter>> {
        let mut current = self.current.write().await;

        if let Some(existing) = current.as_ref() {
            if existing.config == config {
                if existing.adapter.is_connected() {
                    debug!("Already using {} database", config.kind);
                    return Ok(Arc::clone(&existing.adapter));
                }
                self.registry.evict(&config).await;
            }
        }

        let adapter = self.registry.create_adapter(&config).await?;

        if let Some(previous) = current.take() {
            if previous.config != config {
                self.registry.evict(&previous.config).await;
            }
            if !Arc::ptr_eq(&previous.adapter, &adapter) {
                if let Err(e) = previous.adapter.disconnect().await {
                    warn!("Failed to disconnect {} database: {}", previous.config.kind, e);
                }
            }
            info!("Switched database {} -> {}", previous.config.kind, config.kind);
        } else {
            info!("Using {} database", config.kind);
        }

        *current = Some(Current {
            config,
            adapter: Arc::clone(&adapter),
        });
        Ok(adapter)
    }

    /// Status of the current adapter.
    pub async fn get_status(&self) -> DatabaseStatus {
        match self.current.read().await.as_ref() {
            Some(current) => DatabaseStatus {
                connected: current.adapter.is_connected(),
                backend_kind: Some(current.config.kind),
                config: Some(current.config.redacted()),
            },
            None => DatabaseStatus {
                connected: false,
                backend_kind: None,
                config: None,
            },
        }
    }

    /// Create any missing site tables. Returns the names created.
    pub async fn create_tables(&self) -> Result<Vec<String>> {
        let (adapter, dialect) = self.adapter_and_dialect().await?;
        let mut created = Vec::new();

        for table in schema::tables() {
            if adapter.table_exists(&table.name).await? {
                debug!("Table {} already exists", table.name);
                continue;
            }
            adapter
                .execute(&schema::create_table_sql(&table, dialect), &[])
                .await?;
            info!("Created table {}", table.name);
            created.push(table.name);
        }

        Ok(created)
    }

    /// Insert starter content into every empty site table. Tables that
    /// already hold rows are left alone, so repeated calls insert nothing.
    /// Returns the number of rows inserted.
    pub async fn insert_sample_data(&self) -> Result<u64> {
        let (adapter, dialect) = self.adapter_and_dialect().await?;
        let mut inserted = 0;

        for (table, rows) in schema::sample_rows() {
            let count = adapter
                .query(&format!("SELECT COUNT(*) AS count FROM {}", table), &[])
                .await?
                .first()
                .and_then(|r| r.get("count").and_then(SqlValue::as_i64))
                .unwrap_or(0);
            if count > 0 {
                debug!("{} already has {} rows, skipping sample data", table, count);
                continue;
            }

            for record in &rows {
                let params: Vec<SqlValue> = record.values().cloned().collect();
                adapter
                    .execute(&schema::insert_sql(dialect, table, record), &params)
                    .await?;
                inserted += 1;
            }
            info!("Inserted {} sample rows into {}", rows.len(), table);
        }

        Ok(inserted)
    }

    /// Disconnect every adapter and forget the current one.
    pub async fn close(&self) {
        let mut current = self.current.write().await;
        self.registry.close_all().await;
        if let Some(previous) = current.take() {
            // Evicted adapters are not in the registry any more.
            if previous.adapter.is_connected() {
                if let Err(e) = previous.adapter.disconnect().await {
                    warn!("Failed to disconnect {} database: {}", previous.config.kind, e);
                }
            }
        }
    }

    async fn adapter_and_dialect(&self) -> Result<(Arc<dyn DatabaseAdapter>, Dialect)> {
        let current = self.current.read().await;
        let current = current
            .as_ref()
            .ok_or_else(|| DbError::not_connected("manager"))?;
        Ok((Arc::clone(&current.adapter), current.config.kind.dialect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> AdapterConfig {
        AdapterConfig::for_kind(BackendKind::Memory)
    }

    #[tokio::test]
    async fn test_adapter_before_initialize() {
        let manager = DatabaseManager::new();
        assert!(matches!(
            manager.adapter().await,
            Err(DbError::NotConnected { .. })
        ));
        let status = manager.get_status().await;
        assert!(!status.connected);
        assert!(status.backend_kind.is_none());
    }

    #[tokio::test]
    async fn test_initialize_and_status() {
        let manager = DatabaseManager::new();
        let config = AdapterConfig {
            password: "hunter2".into(),
            ..AdapterConfig::for_kind(BackendKind::Sqlite)
        };
        let adapter = manager.initialize(Some(config)).await.unwrap();
        assert_eq!(adapter.get_type(), "sqlite");

        let status = manager.get_status().await;
        assert!(status.connected);
        assert_eq!(status.backend_kind, Some(BackendKind::Sqlite));
        assert_eq!(status.config.unwrap().password, "********");
    }

    #[tokio::test]
    async fn test_switch_database_disconnects_previous() {
        let manager = DatabaseManager::new();
        let first = manager.initialize(Some(memory())).await.unwrap();
        let second = manager
            .switch_database(AdapterConfig::for_kind(BackendKind::Sqlite))
            .await
            .unwrap();

        assert!(!first.is_connected());
        assert!(second.is_connected());
        assert!(Arc::ptr_eq(&manager.adapter().await.unwrap(), &second));

        // Switching back builds a fresh adapter, the old one was evicted.
        let third = manager.switch_database(memory()).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_failed_switch_keeps_current() {
        let manager = DatabaseManager::new();
        let first = manager.initialize(Some(memory())).await.unwrap();
        let bad = AdapterConfig {
            file_path: None,
            ..AdapterConfig::for_kind(BackendKind::Json)
        };
        assert!(manager.switch_database(bad).await.is_err());
        assert!(first.is_connected());
        assert_eq!(manager.get_status().await.backend_kind, Some(BackendKind::Memory));
    }

    #[tokio::test]
    async fn test_create_tables_and_seed_idempotent() {
        let manager = DatabaseManager::new();
        manager
            .initialize(Some(AdapterConfig::for_kind(BackendKind::Sqlite)))
            .await
            .unwrap();

        let created = manager.create_tables().await.unwrap();
        assert_eq!(created, vec!["users", "blogs", "videos", "page_views"]);
        assert!(manager.create_tables().await.unwrap().is_empty());

        let first = manager.insert_sample_data().await.unwrap();
        assert_eq!(first, 6);
        assert_eq!(manager.insert_sample_data().await.unwrap(), 0);

        let adapter = manager.adapter().await.unwrap();
        let blogs = adapter
            .query("SELECT * FROM blogs WHERE slug = ?", &["kyoto-in-autumn".into()])
            .await
            .unwrap();
        assert_eq!(blogs.len(), 1);
        assert_eq!(blogs[0].get("id"), Some(&SqlValue::Int(3)));

        let columns = adapter.describe_table("videos").await.unwrap();
        assert_eq!(columns[0].native_type, "INTEGER");
    }

    #[tokio::test]
    async fn test_close_forgets_adapter() {
        let manager = DatabaseManager::new();
        let adapter = manager.initialize(Some(memory())).await.unwrap();
        manager.close().await;
        assert!(!adapter.is_connected());
        assert!(manager.adapter().await.is_err());
    }
}
