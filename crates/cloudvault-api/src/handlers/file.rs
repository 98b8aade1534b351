//! File handlers: upload, download, rename, move, delete and sharing.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use bytes::Bytes;

use cloudvault_core::error::AppError;
use cloudvault_core::types::{FileId, ItemRef, UserId};
use cloudvault_entity::share::ShareGrant;
use cloudvault_service::file::{FileView, UploadRequest};
use cloudvault_service::share::GranteeView;

use super::content_disposition;
use crate::dto::request::{DownloadQuery, MoveRequest, RenameRequest, ShareRequest, UploadQuery};
use crate::dto::response::UnshareResponse;
use crate::dto::{ApiResponse, validate_body};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/files?directory=&name=&relative_path=
///
/// The request body is the file content.
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ApiResponse<FileView>>)> {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let file = state
        .upload_service
        .upload(
            &auth,
            UploadRequest {
                directory: query.directory,
                name: query.name.unwrap_or_default(),
                relative_path: query.relative_path,
                mime_type,
                data: body,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(file))))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<FileView>>> {
    let file = state.file_service.get_file(&auth, id).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// GET /api/files/{id}/download?inline=
pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let download = state.file_service.download(&auth, id, query.inline).await?;

    let disposition = if download.inline { "inline" } else { "attachment" };
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(disposition, &download.filename),
        )
        .header(header::CONTENT_LENGTH, download.data.len())
        .body(Body::from(download.data))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;
    Ok(response)
}

/// PUT /api/files/{id}
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<ApiResponse<FileView>>> {
    validate_body(&req)?;
    let file = state.file_service.rename_file(&auth, id, &req.name).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// PUT /api/files/{id}/move
pub async fn move_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Json<ApiResponse<FileView>>> {
    let file = state.file_service.move_file(&auth, id, req.parent).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<StatusCode> {
    state.file_service.delete_file(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/files/{id}/shares
pub async fn list_shares(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<Vec<GranteeView>>>> {
    let grantees = state
        .share_service
        .list_grantees(&auth, ItemRef::File(id))
        .await?;
    Ok(Json(ApiResponse::ok(grantees)))
}

/// POST /api/files/{id}/shares
pub async fn share_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<ShareRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ShareGrant>>)> {
    validate_body(&req)?;
    let grant = state.file_service.share_file(&auth, id, &req.email).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(grant))))
}

/// DELETE /api/files/{id}/shares/{user_id}
pub async fn unshare_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(FileId, UserId)>,
) -> ApiResult<Json<ApiResponse<UnshareResponse>>> {
    let removed = state.file_service.unshare_file(&auth, id, user_id).await?;
    Ok(Json(ApiResponse::ok(UnshareResponse {
        removed: u64::from(removed),
    })))
}
