//! Configuration validation.

use super::{AdapterConfig, BackendKind, MigrationFile};
use crate::error::{DbError, Result};

/// Validate a single adapter configuration.
pub fn validate_adapter(config: &AdapterConfig, label: &str) -> Result<()> {
    if config.connection_limit == 0 {
        return Err(DbError::Config(format!(
            "{}.connection_limit must be at least 1",
            label
        )));
    }

    match config.kind {
        BackendKind::Mysql => {
            if config.host.is_empty() {
                return Err(DbError::Config(format!("{}.host is required", label)));
            }
            if config.port == 0 {
                return Err(DbError::Config(format!("{}.port must be non-zero", label)));
            }
            if config.database.is_empty() {
                return Err(DbError::Config(format!("{}.database is required", label)));
            }
        }
        BackendKind::Json => {
            if config.file_path.is_none() {
                return Err(DbError::Config(format!(
                    "{}.file_path is required for the json backend",
                    label
                )));
            }
        }
        BackendKind::Sqlite | BackendKind::Memory => {}
    }

    Ok(())
}

/// Validate a migration job file.
pub fn validate_migration(file: &MigrationFile) -> Result<()> {
    validate_adapter(&file.source, "source")?;
    validate_adapter(&file.target, "target")?;

    // Identical configs resolve to one cached adapter instance.
    if file.source == file.target {
        return Err(DbError::Config(
            "source and target cannot be the same database".into(),
        ));
    }

    if file.migration.batch_size == 0 {
        return Err(DbError::Config(
            "migration.batch_size must be at least 1".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigrateOptions;

    fn valid_file() -> MigrationFile {
        MigrationFile {
            source: AdapterConfig::default(),
            target: AdapterConfig::json_file("/tmp/travelweb.json"),
            migration: MigrateOptions::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_migration(&valid_file()).is_ok());
    }

    #[test]
    fn test_missing_host() {
        let mut file = valid_file();
        file.source.host = String::new();
        let err = validate_migration(&file).unwrap_err();
        assert!(err.to_string().contains("source.host"));
    }

    #[test]
    fn test_json_requires_file_path() {
        let mut file = valid_file();
        file.target.file_path = None;
        let err = validate_migration(&file).unwrap_err();
        assert!(err.to_string().contains("target.file_path"));
    }

    #[test]
    fn test_same_database_rejected() {
        let mut file = valid_file();
        file.target = file.source.clone();
        assert!(validate_migration(&file).is_err());
    }

    #[test]
    fn test_memory_to_sqlite_allowed() {
        let mut file = valid_file();
        file.source = AdapterConfig::for_kind(BackendKind::Memory);
        file.target = AdapterConfig::for_kind(BackendKind::Sqlite);
        assert!(validate_migration(&file).is_ok());
    }

    #[test]
    fn test_zero_batch_size() {
        let mut file = valid_file();
        file.migration.batch_size = 0;
        assert!(validate_migration(&file).is_err());
    }

    #[test]
    fn test_zero_connection_limit() {
        let mut file = valid_file();
        file.source.connection_limit = 0;
        assert!(validate_migration(&file).is_err());
    }
}
