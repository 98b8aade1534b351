//! Share listing handlers.

use axum::Json;
use axum::extract::State;

use cloudvault_service::directory::SharedWithMe;
use cloudvault_service::share::OutgoingShareView;

use crate::dto::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/shares/incoming
pub async fn list_incoming(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<SharedWithMe>>> {
    let shared = state.directory_service.list_shared_with_me(&auth).await?;
    Ok(Json(ApiResponse::ok(shared)))
}

/// GET /api/shares/outgoing
pub async fn list_outgoing(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<OutgoingShareView>>>> {
    let grants = state.share_service.list_outgoing(&auth).await?;
    Ok(Json(ApiResponse::ok(grants)))
}
