//! Health check handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::dto::ApiResponse;
use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
///
/// Reports 503 when the database or the blob store is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let database = state.db.health_check().await.unwrap_or_else(|e| {
        warn!(error = %e, "Database health check failed");
        false
    });
    let storage = state.blobs.health_check().await.unwrap_or_else(|e| {
        warn!(error = %e, "Blob store health check failed");
        false
    });

    let healthy = database && storage;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            storage,
        })),
    )
}
