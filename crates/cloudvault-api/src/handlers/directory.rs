//! Directory handlers: listing, CRUD, sharing and archive download.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;

use cloudvault_core::error::AppError;
use cloudvault_core::types::{DirectoryId, DirectoryRef, ItemRef, UserId};
use cloudvault_entity::directory::Directory;
use cloudvault_service::directory::{DeleteSummary, DirectoryListing, ShareOutcome};
use cloudvault_service::share::GranteeView;

use super::content_disposition;
use crate::dto::request::{CreateDirectoryRequest, MoveRequest, RenameRequest, ShareRequest};
use crate::dto::response::UnshareResponse;
use crate::dto::{ApiResponse, validate_body};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/directories/{id}
pub async fn list_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dir): Path<DirectoryRef>,
) -> ApiResult<Json<ApiResponse<DirectoryListing>>> {
    let listing = state.directory_service.list_directory(&auth, dir).await?;
    Ok(Json(ApiResponse::ok(listing)))
}

/// POST /api/directories
pub async fn create_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateDirectoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Directory>>)> {
    validate_body(&req)?;
    let dir = state
        .directory_service
        .add_directory(&auth, &req.name, req.parent)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(dir))))
}

/// PUT /api/directories/{id}
pub async fn rename_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DirectoryId>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<ApiResponse<Directory>>> {
    validate_body(&req)?;
    let dir = state
        .directory_service
        .rename_directory(&auth, id, &req.name)
        .await?;
    Ok(Json(ApiResponse::ok(dir)))
}

/// PUT /api/directories/{id}/move
pub async fn move_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DirectoryId>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Json<ApiResponse<Directory>>> {
    let dir = state
        .directory_service
        .move_directory(&auth, id, req.parent)
        .await?;
    Ok(Json(ApiResponse::ok(dir)))
}

/// DELETE /api/directories/{id}
pub async fn delete_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dir): Path<DirectoryRef>,
) -> ApiResult<Json<ApiResponse<DeleteSummary>>> {
    let summary = state.directory_service.delete_directory(&auth, dir).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// GET /api/directories/{id}/archive
pub async fn download_archive(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dir): Path<DirectoryRef>,
) -> ApiResult<Response> {
    let archive = state.directory_service.download_archive(&auth, dir).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition("attachment", &archive.filename),
        )
        .header(header::CONTENT_LENGTH, archive.data.len())
        .body(Body::from(archive.data))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;
    Ok(response)
}

/// GET /api/directories/{id}/shares
pub async fn list_shares(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DirectoryId>,
) -> ApiResult<Json<ApiResponse<Vec<GranteeView>>>> {
    let grantees = state
        .share_service
        .list_grantees(&auth, ItemRef::Directory(id))
        .await?;
    Ok(Json(ApiResponse::ok(grantees)))
}

/// POST /api/directories/{id}/shares
pub async fn share_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DirectoryId>,
    Json(req): Json<ShareRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ShareOutcome>>)> {
    validate_body(&req)?;
    let outcome = state
        .directory_service
        .share_directory(&auth, id, &req.email)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome))))
}

/// DELETE /api/directories/{id}/shares/{user_id}
pub async fn unshare_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(DirectoryId, UserId)>,
) -> ApiResult<Json<ApiResponse<UnshareResponse>>> {
    let removed = state
        .directory_service
        .unshare_directory(&auth, id, user_id)
        .await?;
    Ok(Json(ApiResponse::ok(UnshareResponse { removed })))
}
