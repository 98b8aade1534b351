//! Listing enrichment: live blob size, preview availability and share flags.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use cloudvault_core::config::PreviewConfig;
use cloudvault_core::result::AppResult;
use cloudvault_core::traits::BlobStore;
use cloudvault_core::types::{DirectoryId, FileId, ItemRef, UserId};
use cloudvault_database::repositories::ShareRepository;
use cloudvault_entity::file::FileEntry;

/// A file as presented to one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct FileView {
    /// File ID.
    pub id: FileId,
    /// User-visible name.
    pub name: String,
    /// MIME type recorded at upload.
    pub mime_type: String,
    /// Size in bytes; the live blob size when the blob exists.
    pub size: u64,
    /// Containing directory.
    pub directory_id: DirectoryId,
    /// Uploader.
    pub owner_id: UserId,
    /// Upload time.
    pub created_at: DateTime<Utc>,
    /// The blob is gone from storage although the row remains.
    pub blob_missing: bool,
    /// Whether the file may be shown inline.
    pub preview_available: bool,
    /// The viewer reaches this file through a share.
    pub is_shared: bool,
    /// The viewer owns the file and has shared it with someone.
    pub shared_by_me: bool,
}

/// Builds [`FileView`]s from stored rows.
#[derive(Debug, Clone)]
pub struct FileEnricher {
    /// Blob store for live sizes.
    blobs: Arc<dyn BlobStore>,
    /// Share repository for outgoing-share flags.
    share_repo: Arc<ShareRepository>,
    /// Inline preview policy.
    preview: PreviewConfig,
}

impl FileEnricher {
    /// Creates a new enricher.
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        share_repo: Arc<ShareRepository>,
        preview: PreviewConfig,
    ) -> Self {
        Self {
            blobs,
            share_repo,
            preview,
        }
    }

    /// Whether a MIME type may be shown inline.
    pub fn is_previewable(&self, mime_type: &str) -> bool {
        self.preview.is_previewable(mime_type)
    }

    /// Enrich one file for `viewer_id`.
    pub async fn enrich(&self, file: FileEntry, viewer_id: UserId) -> AppResult<FileView> {
        let live_size = match self.blobs.size(&file.stored_blob_id).await {
            Ok(size) => size,
            Err(e) => {
                warn!(file_id = %file.id, error = %e, "Could not stat blob, using recorded size");
                Some(u64::try_from(file.byte_size).unwrap_or_default())
            }
        };

        let owned = file.is_owned_by(viewer_id);
        let shared_by_me = owned
            && self
                .share_repo
                .is_shared_by(ItemRef::File(file.id), viewer_id)
                .await?;

        Ok(FileView {
            id: file.id,
            preview_available: self.is_previewable(&file.mime_type),
            size: live_size.unwrap_or_else(|| u64::try_from(file.byte_size).unwrap_or_default()),
            blob_missing: live_size.is_none(),
            name: file.display_name,
            mime_type: file.mime_type,
            directory_id: file.directory_id,
            owner_id: file.owner_id,
            created_at: file.created_at,
            is_shared: !owned,
            shared_by_me,
        })
    }

    /// Enrich a listing, keeping its order.
    pub async fn enrich_all(&self, files: Vec<FileEntry>, viewer_id: UserId) -> AppResult<Vec<FileView>> {
        let mut views = Vec::with_capacity(files.len());
        for file in files {
            views.push(self.enrich(file, viewer_id).await?);
        }
        Ok(views)
    }
}
