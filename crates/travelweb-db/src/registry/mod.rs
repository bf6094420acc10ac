//! Adapter registry.
//!
//! [`AdapterRegistry`] builds, connects and caches adapters keyed by their
//! configuration. It is an ordinary value owned by whoever needs it (the
//! manager, the migration tool, tests); there is no process-wide instance.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{AdapterConfig, BackendKind};
use crate::core::DatabaseAdapter;
use crate::drivers::{EmulatedAdapter, FileAdapter, MemoryAdapter, MysqlAdapter};
use crate::error::Result;

/// Instantiate the concrete adapter for a configuration. The adapter is not
/// connected.
pub fn build_adapter(config: &AdapterConfig) -> Result<Arc<dyn DatabaseAdapter>> {
    config.validate()?;
    let adapter: Arc<dyn DatabaseAdapter> = match config.kind {
        BackendKind::Mysql => Arc::new(MysqlAdapter::new(config.clone())),
        BackendKind::Sqlite => Arc::new(EmulatedAdapter::new(config)),
        BackendKind::Json => Arc::new(FileAdapter::new(config)),
        BackendKind::Memory => Arc::new(MemoryAdapter::new(config)),
    };
    Ok(adapter)
}

/// Cache of connected adapters, one instance per configuration.
#[derive(Default)]
pub struct AdapterRegistry {
    /// Cached adapters by `AdapterConfig::cache_key`.
    ///
    /// Held across the whole build-and-connect step so concurrent callers
    /// with the same configuration get the same instance.
    adapters: Mutex<HashMap<String, Arc<dyn DatabaseAdapter>>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached adapter for `config`, building and connecting it on
    /// first use. A failed connect caches nothing.
    pub async fn create_adapter(&self, config: &AdapterConfig) -> Result<Arc<dyn DatabaseAdapter>> {
        let key = config.cache_key();
        let mut adapters = self.adapters.lock().await;

        if let Some(existing) = adapters.get(&key) {
            debug!("Reusing cached {} adapter", config.kind);
            return Ok(Arc::clone(existing));
        }

        let adapter = build_adapter(config)?;
        adapter.connect().await?;
        info!("Connected {} adapter", adapter.get_type());

        adapters.insert(key, Arc::clone(&adapter));
        Ok(adapter)
    }

    /// [`create_adapter`](Self::create_adapter) with configuration read from
    /// the process environment.
    pub async fn create_from_env(&self) -> Result<Arc<dyn DatabaseAdapter>> {
        let config = AdapterConfig::from_env()?;
        self.create_adapter(&config).await
    }

    /// Drop the cached adapter for `config` without disconnecting it.
    pub async fn evict(&self, config: &AdapterConfig) -> Option<Arc<dyn DatabaseAdapter>> {
        self.adapters.lock().await.remove(&config.cache_key())
    }

    /// Disconnect every cached adapter concurrently and clear the cache.
    ///
    /// Individual failures are logged, never returned.
    pub async fn close_all(&self) {
        let drained: Vec<Arc<dyn DatabaseAdapter>> =
            self.adapters.lock().await.drain().map(|(_, a)| a).collect();
        if drained.is_empty() {
            return;
        }

        let results = join_all(drained.iter().map(|a| a.disconnect())).await;
        for (adapter, result) in drained.iter().zip(results) {
            if let Err(e) = result {
                warn!("Failed to disconnect {} adapter: {}", adapter.get_type(), e);
            }
        }
        info!("Closed {} adapter(s)", drained.len());
    }

    pub async fn len(&self) -> usize {
        self.adapters.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.adapters.lock().await.is_empty()
    }

    /// Whether an adapter for `config` is cached.
    pub async fn contains(&self, config: &AdapterConfig) -> bool {
        self.adapters.lock().await.contains_key(&config.cache_key())
    }
}
