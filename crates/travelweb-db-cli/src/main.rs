//! travelweb-db CLI - migrations, health checks and schema setup.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use travelweb_db::{
    AdapterConfig, AdapterRegistry, DatabaseAdapter, DatabaseManager, DbError, MigrationFile,
    Migrator,
};

#[derive(Parser)]
#[command(name = "travelweb-db")]
#[command(about = "Storage adapters, schema setup and migrations for travelweb")]
#[command(version)]
struct Cli {
    /// Log format: text or json
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info", global = true)]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy tables from the source database to the target database
    Migrate {
        /// Path to YAML migration file
        #[arg(short, long)]
        config: PathBuf,

        /// Only migrate these tables (comma separated)
        #[arg(long, value_delimiter = ',')]
        tables: Vec<String>,

        /// Drop and recreate target tables that already exist
        #[arg(long)]
        drop_existing: bool,

        /// Rows per batch [default: from file, or 1000]
        #[arg(long)]
        batch_size: Option<usize>,

        /// Skip the row count comparison after copying
        #[arg(long)]
        no_validate: bool,

        /// Write the migration log to this file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Output JSON result to stdout
        #[arg(long)]
        output_json: bool,
    },

    /// Test database connections
    HealthCheck {
        /// Migration file whose source and target are probed [default: DB_* environment]
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Create the site tables on the DB_* database
    InitSchema {
        /// Also insert sample content into empty tables
        #[arg(long)]
        seed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DbError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    match cli.command {
        Commands::Migrate {
            config,
            tables,
            drop_existing,
            batch_size,
            no_validate,
            log_file,
            output_json,
        } => {
            let mut file = MigrationFile::load(&config)?;
            info!("Loaded migration file {:?}", config);

            let options = &mut file.migration;
            if !tables.is_empty() {
                options.tables = tables;
            }
            if drop_existing {
                options.drop_existing = true;
            }
            if let Some(size) = batch_size {
                options.batch_size = size;
            }
            if no_validate {
                options.validate_data = false;
            }

            let registry = AdapterRegistry::new();
            let outcome = migrate(&registry, &file, log_file, output_json).await;
            registry.close_all().await;
            outcome?;
        }

        Commands::HealthCheck { config } => {
            let targets = match config {
                Some(path) => {
                    let file = MigrationFile::load(&path)?;
                    vec![("Source", file.source), ("Target", file.target)]
                }
                None => vec![("Database", AdapterConfig::from_env()?)],
            };

            let registry = AdapterRegistry::new();
            let mut healthy = true;
            println!("Health Check Results:");
            for (label, config) in targets {
                let start = Instant::now();
                let probe = match registry.create_adapter(&config).await {
                    Ok(adapter) => probe(adapter.as_ref()).await,
                    Err(e) => Err(e.to_string()),
                };
                let elapsed = start.elapsed().as_millis();
                match probe {
                    Ok(()) => println!("  {} ({}): OK ({}ms)", label, config.kind, elapsed),
                    Err(err) => {
                        healthy = false;
                        println!("  {} ({}): FAILED ({}ms)", label, config.kind, elapsed);
                        println!("    Error: {}", err);
                    }
                }
            }
            registry.close_all().await;
            println!(
                "\n  Overall: {}",
                if healthy { "HEALTHY" } else { "UNHEALTHY" }
            );

            if !healthy {
                return Err(DbError::connection("Health check failed", "health-check"));
            }
        }

        Commands::InitSchema { seed } => {
            let manager = DatabaseManager::new();
            let outcome = init_schema(&manager, seed).await;
            manager.close().await;
            outcome?;
        }
    }

    Ok(())
}

async fn migrate(
    registry: &AdapterRegistry,
    file: &MigrationFile,
    log_file: Option<PathBuf>,
    output_json: bool,
) -> Result<(), DbError> {
    let mut migrator = Migrator::from_file(registry, file).await?;
    let result = migrator.migrate(&file.migration).await?;

    if let Some(path) = log_file {
        migrator.save_log(&path).await?;
        info!("Migration log written to {:?}", path);
    }

    if output_json {
        println!("{}", result.to_json()?);
    } else {
        println!(
            "\n{}",
            if result.success {
                "Migration completed!"
            } else {
                "Migration finished with errors"
            }
        );
        println!("  Run ID: {}", result.run_id);
        println!("  Duration: {}ms", result.duration_ms);
        println!("  Tables: {}", result.tables_processed);
        println!("  Rows: {}", result.records_migrated);
        for warning in &result.warnings {
            println!("  Warning: {}", warning);
        }
        for error in &result.errors {
            println!("  Error: {}", error);
        }
    }

    if !result.success {
        let failed: Vec<&str> = result
            .errors
            .iter()
            .filter_map(|e| e.split(": ").next())
            .collect();
        return Err(DbError::migration(
            failed.join(", "),
            format!("{} error(s), see output above", result.errors.len()),
        ));
    }
    Ok(())
}

async fn probe(adapter: &dyn DatabaseAdapter) -> Result<(), String> {
    if !adapter.test_connection().await {
        return Err("connection test failed".to_string());
    }
    match adapter.check_integrity().await {
        Ok(true) => Ok(()),
        Ok(false) => Err("integrity check failed".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

async fn init_schema(manager: &DatabaseManager, seed: bool) -> Result<(), DbError> {
    let adapter = manager.initialize(None).await?;
    let created = manager.create_tables().await?;
    if created.is_empty() {
        println!("Schema up to date on {}", adapter.get_type());
    } else {
        println!("Created tables on {}: {}", adapter.get_type(), created.join(", "));
    }

    if seed {
        let inserted = manager.insert_sample_data().await?;
        println!("Inserted {} sample rows", inserted);
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    // RUST_LOG takes precedence over --verbosity.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
