//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{DbError, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

impl AdapterConfig {
    /// Build a configuration from the process environment.
    ///
    /// Reads `DB_TYPE`, `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`,
    /// `DB_NAME`, `DB_FILE_PATH` and `DB_CONNECTION_LIMIT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = AdapterConfig::default();

        if let Some(kind) = get("DB_TYPE") {
            config.kind = kind.parse()?;
        }
        if let Some(host) = get("DB_HOST") {
            config.host = host;
        }
        if let Some(port) = get("DB_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| DbError::Config(format!("DB_PORT is not a valid port: '{}'", port)))?;
        }
        if let Some(user) = get("DB_USER") {
            config.user = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            config.password = password;
        }
        if let Some(database) = get("DB_NAME") {
            config.database = database;
        }
        if let Some(path) = get("DB_FILE_PATH") {
            config.file_path = Some(PathBuf::from(path));
        } else if config.kind == BackendKind::Json {
            config.file_path = Some(PathBuf::from(crate::drivers::DEFAULT_FILE_PATH));
        }
        if let Some(limit) = get("DB_CONNECTION_LIMIT") {
            config.connection_limit = limit.trim().parse().map_err(|_| {
                DbError::Config(format!("DB_CONNECTION_LIMIT is not a number: '{}'", limit))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate_adapter(self, "config")
    }

    /// Registry cache key: the serialized configuration.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

impl MigrationFile {
    /// Load a migration job from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a migration job from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: MigrationFile = serde_yaml::from_str(yaml)?;
        file.validate()?;
        Ok(file)
    }

    /// Validate the job.
    pub fn validate(&self) -> Result<()> {
        validation::validate_migration(self)
    }

    /// SHA256 hash of the job, recorded in the migration log header.
    pub fn hash(&self) -> String {
        let yaml = serde_yaml::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
