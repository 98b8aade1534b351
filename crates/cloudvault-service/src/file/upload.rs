//! File upload: whole-body uploads, optionally recreating a client-side
//! folder structure below the target directory.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use cloudvault_core::config::StorageConfig;
use cloudvault_core::error::{AppError, ConflictReason, ErrorKind};
use cloudvault_core::result::AppResult;
use cloudvault_core::traits::BlobStore;
use cloudvault_core::types::{DirectoryRef, ItemRef, UserId};
use cloudvault_database::repositories::{DirectoryRepository, FileRepository, ShareRepository};
use cloudvault_entity::directory::{CreateDirectory, Directory};
use cloudvault_entity::file::CreateFileEntry;
use cloudvault_storage::{mime_from_path, new_blob_id};

use super::preview::{FileEnricher, FileView};
use crate::context::RequestContext;
use crate::validation::{relative_directories, validate_name};

const FALLBACK_MIME: &str = "application/octet-stream";

/// A complete upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target directory.
    pub directory: DirectoryRef,
    /// File name. When empty, the last segment of `relative_path` is used.
    pub name: String,
    /// Client-side path such as `photos/2024/beach.jpg`; its directory part
    /// is recreated below `directory`.
    pub relative_path: Option<String>,
    /// Declared content type.
    pub mime_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

/// Stores uploaded files.
#[derive(Debug, Clone)]
pub struct UploadService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Directory repository.
    dir_repo: Arc<DirectoryRepository>,
    /// Share repository, for grants inherited from the target directory.
    share_repo: Arc<ShareRepository>,
    /// Blob store.
    blobs: Arc<dyn BlobStore>,
    /// Listing enrichment.
    enricher: Arc<FileEnricher>,
    /// Upload limits.
    config: StorageConfig,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        dir_repo: Arc<DirectoryRepository>,
        share_repo: Arc<ShareRepository>,
        blobs: Arc<dyn BlobStore>,
        enricher: Arc<FileEnricher>,
        config: StorageConfig,
    ) -> Self {
        Self {
            file_repo,
            dir_repo,
            share_repo,
            blobs,
            enricher,
            config,
        }
    }

    /// Largest accepted upload, in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.config.max_upload_size_bytes
    }

    /// Stores an upload in a directory the caller owns.
    ///
    /// The blob is written first under a fresh opaque id; if recording the
    /// row then fails the blob is removed again. New directories and the
    /// file itself are shared with everyone their parent is shared with.
    pub async fn upload(&self, ctx: &RequestContext, req: UploadRequest) -> AppResult<FileView> {
        if req.data.len() as u64 > self.config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }

        let raw_name = if req.name.trim().is_empty() {
            req.relative_path
                .as_deref()
                .and_then(|path| path.rsplit(['/', '\\']).next())
                .unwrap_or_default()
        } else {
            req.name.as_str()
        };
        let name = validate_name(raw_name)?;
        let folders = match req.relative_path.as_deref() {
            Some(path) => relative_directories(path)?,
            None => Vec::new(),
        };

        let mut directory = self
            .dir_repo
            .resolve_parent(req.directory, ctx.user_id)
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => {
                    AppError::forbidden("You cannot upload into this directory")
                }
                _ => e,
            })?;
        for folder in &folders {
            directory = self.child_directory(&directory, folder, ctx.user_id).await?;
        }

        let mime_type = req
            .mime_type
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty() && m != FALLBACK_MIME)
            .or_else(|| mime_from_path(&name))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        let blob_id = new_blob_id();
        let byte_size = req.data.len();
        self.blobs.write(&blob_id, req.data).await?;

        let record = CreateFileEntry {
            display_name: name,
            stored_blob_id: blob_id.clone(),
            mime_type,
            byte_size: i64::try_from(byte_size).unwrap_or(i64::MAX),
            directory_id: directory.id,
            owner_id: ctx.user_id,
        };
        let file = match self.file_repo.create(&record).await {
            Ok(file) => file,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&blob_id).await {
                    warn!(blob_id = %blob_id, error = %cleanup, "Failed to remove orphaned blob");
                }
                return Err(e);
            }
        };
        self.share_repo
            .inherit_grants(directory.id, ItemRef::File(file.id), ctx.user_id)
            .await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file.id,
            directory_id = %directory.id,
            bytes = byte_size,
            "File uploaded"
        );
        self.enricher.enrich(file, ctx.user_id).await
    }

    /// Reuse the owner's child directory named `name`, or create it.
    async fn child_directory(
        &self,
        parent: &Directory,
        name: &str,
        owner_id: UserId,
    ) -> AppResult<Directory> {
        if let Some(existing) = self
            .dir_repo
            .find_child_by_name(parent.id, owner_id, name)
            .await?
        {
            return Ok(existing);
        }

        let data = CreateDirectory {
            name: name.to_string(),
            parent_id: Some(parent.id),
            owner_id,
        };
        match self.dir_repo.create(&data).await {
            Ok(dir) => {
                debug!(directory_id = %dir.id, name, "Created directory for upload path");
                self.share_repo
                    .inherit_grants(parent.id, dir.item_ref(), owner_id)
                    .await?;
                Ok(dir)
            }
            // A concurrent upload created it first.
            Err(e) if e.is_conflict(ConflictReason::NameTaken) => self
                .dir_repo
                .find_child_by_name(parent.id, owner_id, name)
                .await?
                .ok_or(e),
            Err(e) => Err(e),
        }
    }
}
