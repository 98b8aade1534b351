//! Database migration management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cloudvault_core::error::AppError;
use cloudvault_database::DatabasePool;
use cloudvault_database::migration::{applied_migrations, run_migrations};

use super::Cli;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Show applied migrations
    Status,
}

/// Migration display row
#[derive(Debug, Serialize, Tabled)]
struct MigrationRow {
    /// Version
    version: i64,
    /// Description
    description: String,
    /// Applied successfully
    success: bool,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, cli: &Cli) -> Result<(), AppError> {
    let config = cli.load_config()?;
    let db = DatabasePool::connect(&config.database).await?;
    let printer = cli.printer();
    let mut out = std::io::stdout().lock();

    match &args.command {
        MigrateCommand::Run => {
            run_migrations(db.pool()).await?;
            let applied = applied_migrations(db.pool()).await?;
            printer.confirm(
                &mut out,
                "All migrations applied",
                &[("Applied", applied.len().to_string())],
            )?;
        }
        MigrateCommand::Status => {
            let rows: Vec<MigrationRow> = applied_migrations(db.pool())
                .await?
                .into_iter()
                .map(|m| MigrationRow {
                    version: m.version,
                    description: m.description,
                    success: m.success,
                })
                .collect();
            printer.rows(&mut out, &rows, "No migrations applied.")?;
        }
    }

    db.close().await;
    Ok(())
}
