//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use cloudvault_core::config::AppConfig;
use cloudvault_core::traits::BlobStore;
use cloudvault_database::DatabasePool;
use cloudvault_service::{
    DirectoryService, FileService, Services, ShareService, UploadService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// SQLite connection pool
    pub db: DatabasePool,
    /// Blob store
    pub blobs: Arc<dyn BlobStore>,

    // ── Services ─────────────────────────────────────────────
    /// Directory facade
    pub directory_service: Arc<DirectoryService>,
    /// File facade
    pub file_service: Arc<FileService>,
    /// Upload service
    pub upload_service: Arc<UploadService>,
    /// Share listings
    pub share_service: Arc<ShareService>,
}

impl AppState {
    /// Builds the state from already-constructed services.
    pub fn new(
        config: Arc<AppConfig>,
        db: DatabasePool,
        blobs: Arc<dyn BlobStore>,
        services: &Services,
    ) -> Self {
        Self {
            config,
            db,
            blobs,
            directory_service: Arc::clone(&services.directories),
            file_service: Arc::clone(&services.files),
            upload_service: Arc::clone(&services.uploads),
            share_service: Arc::clone(&services.shares),
        }
    }
}
