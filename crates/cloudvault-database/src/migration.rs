//! Database migration runner.

use sqlx::SqlitePool;
use tracing::info;

use cloudvault_core::error::{AppError, ErrorKind};

/// Run all pending database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Database migrations completed successfully");
    Ok(())
}

/// One applied migration as recorded by sqlx.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedMigration {
    /// Migration version (the timestamp prefix of the file name).
    pub version: i64,
    /// Human-readable description.
    pub description: String,
    /// Whether the migration completed.
    pub success: bool,
}

/// List migrations recorded in the database, oldest first.
///
/// Returns an empty list on a database that was never migrated.
pub async fn applied_migrations(pool: &SqlitePool) -> Result<Vec<AppliedMigration>, AppError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to inspect schema", e))?;
    if !exists {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, AppliedMigration>(
        "SELECT version, description, success FROM _sqlx_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list migrations", e))
}
