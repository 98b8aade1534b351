//! Route definitions for the CloudVault HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and per-request middleware.
///
/// Bodies larger than the configured upload ceiling are rejected with
/// 413 before reaching a handler.
pub fn build_router(state: AppState) -> Router {
    let max_upload = usize::try_from(state.config.storage.max_upload_size_bytes).unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .merge(directory_routes())
        .merge(file_routes())
        .merge(share_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Directory listing, CRUD, archive and shares
fn directory_routes() -> Router<AppState> {
    Router::new()
        .route("/directories", post(handlers::directory::create_directory))
        .route(
            "/directories/{id}",
            get(handlers::directory::list_directory)
                .put(handlers::directory::rename_directory)
                .delete(handlers::directory::delete_directory),
        )
        .route("/directories/{id}/move", put(handlers::directory::move_directory))
        .route(
            "/directories/{id}/archive",
            get(handlers::directory::download_archive),
        )
        .route(
            "/directories/{id}/shares",
            get(handlers::directory::list_shares).post(handlers::directory::share_directory),
        )
        .route(
            "/directories/{id}/shares/{user_id}",
            delete(handlers::directory::unshare_directory),
        )
}

/// File upload, download, CRUD and shares
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files", post(handlers::file::upload_file))
        .route(
            "/files/{id}",
            get(handlers::file::get_file)
                .put(handlers::file::rename_file)
                .delete(handlers::file::delete_file),
        )
        .route("/files/{id}/move", put(handlers::file::move_file))
        .route("/files/{id}/download", get(handlers::file::download_file))
        .route(
            "/files/{id}/shares",
            get(handlers::file::list_shares).post(handlers::file::share_file),
        )
        .route(
            "/files/{id}/shares/{user_id}",
            delete(handlers::file::unshare_file),
        )
}

/// Share listings
fn share_routes() -> Router<AppState> {
    Router::new()
        .route("/shares/incoming", get(handlers::share::list_incoming))
        .route("/shares/outgoing", get(handlers::share::list_outgoing))
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
