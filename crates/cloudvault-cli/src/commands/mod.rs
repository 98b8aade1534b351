//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod tree;
pub mod user;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use cloudvault_core::config::AppConfig;
use cloudvault_core::error::AppError;
use cloudvault_database::DatabasePool;
use cloudvault_service::Services;
use cloudvault_storage::LocalBlobStore;

use crate::output::{OutputFormat, Printer};

/// CloudVault: multi-user file storage administration
#[derive(Debug, Parser)]
#[command(name = "cloudvault", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and environment overlays
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Environment overlay to load on top of the defaults
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Log more (`-v` info, `-vv` debug); `RUST_LOG` overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// User management
    User(user::UserArgs),
    /// Directory tree inspection
    Tree(tree::TreeArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, self).await,
            Commands::User(args) => user::execute(args, self).await,
            Commands::Tree(args) => tree::execute(args, self).await,
            Commands::Config(args) => config::execute(args, self).await,
        }
    }

    /// Printer for the selected output format.
    pub fn printer(&self) -> Printer {
        Printer::new(self.format)
    }

    /// Load the layered configuration selected on the command line.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load_from(&self.config_dir, &self.env)
    }
}

/// Helper: connect to the configured database and bring the schema up to date
pub async fn open_database(config: &AppConfig) -> Result<DatabasePool, AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    cloudvault_database::migration::run_migrations(db.pool()).await?;
    Ok(db)
}

/// Helper: build every service over the configured database and blob store
pub async fn open_services(config: &AppConfig) -> Result<Services, AppError> {
    let db = open_database(config).await?;
    let blobs = Arc::new(LocalBlobStore::new(&config.storage).await?);
    Ok(Services::new(&db, blobs, config))
}
