//! File facade: rename, move, delete, share, unshare and download.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use cloudvault_core::error::{AppError, ErrorKind};
use cloudvault_core::result::AppResult;
use cloudvault_core::traits::BlobStore;
use cloudvault_core::types::{DirectoryRef, FileId, ItemRef, UserId};
use cloudvault_database::repositories::{DirectoryRepository, FileRepository, ShareRepository};
use cloudvault_entity::share::ShareGrant;

use super::preview::{FileEnricher, FileView};
use crate::access::AccessResolver;
use crate::context::RequestContext;
use crate::share::ShareService;
use crate::validation::validate_name;

/// File bytes ready to be sent to a client.
#[derive(Debug, Clone)]
pub struct FileDownload {
    /// Name to offer the client.
    pub filename: String,
    /// Content type.
    pub mime_type: String,
    /// The bytes.
    pub data: Bytes,
    /// Whether the client should display the file instead of saving it.
    pub inline: bool,
}

/// Handles file operations other than upload.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Directory repository.
    dir_repo: Arc<DirectoryRepository>,
    /// Share repository.
    share_repo: Arc<ShareRepository>,
    /// Access resolver.
    resolver: Arc<AccessResolver>,
    /// Share bookkeeping.
    shares: Arc<ShareService>,
    /// Blob store.
    blobs: Arc<dyn BlobStore>,
    /// Listing enrichment.
    enricher: Arc<FileEnricher>,
}

impl FileService {
    /// Creates a new file service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file_repo: Arc<FileRepository>,
        dir_repo: Arc<DirectoryRepository>,
        share_repo: Arc<ShareRepository>,
        resolver: Arc<AccessResolver>,
        shares: Arc<ShareService>,
        blobs: Arc<dyn BlobStore>,
        enricher: Arc<FileEnricher>,
    ) -> Self {
        Self {
            file_repo,
            dir_repo,
            share_repo,
            resolver,
            shares,
            blobs,
            enricher,
        }
    }

    /// Gets a file the caller may read.
    pub async fn get_file(&self, ctx: &RequestContext, id: FileId) -> AppResult<FileView> {
        let (file, _) = self.resolver.readable_file(ctx, id).await?;
        self.enricher.enrich(file, ctx.user_id).await
    }

    /// Renames a file the caller owns.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        id: FileId,
        new_name: &str,
    ) -> AppResult<FileView> {
        let new_name = validate_name(new_name)?;
        self.resolver.owned_file(ctx, id).await?;

        let file = self.file_repo.rename(id, &new_name, ctx.user_id).await?;

        info!(user_id = %ctx.user_id, file_id = %id, name = %file.display_name, "File renamed");
        self.enricher.enrich(file, ctx.user_id).await
    }

    /// Moves a file the caller owns into a directory they own. The file
    /// keeps its grants and gains those of the destination.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        id: FileId,
        target: DirectoryRef,
    ) -> AppResult<FileView> {
        let file = self.resolver.owned_file(ctx, id).await?;
        let destination = match target {
            DirectoryRef::Root => self.dir_repo.get_or_create_root(ctx.user_id).await?,
            DirectoryRef::Id(dir_id) => self.resolver.owned_directory(ctx, dir_id).await?,
        };

        if file.directory_id == destination.id {
            return self.enricher.enrich(file, ctx.user_id).await;
        }

        if !self.file_repo.move_file(id, destination.id).await? {
            return Err(AppError::not_found("File not found"));
        }
        let moved = self
            .file_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        self.share_repo
            .inherit_grants(destination.id, ItemRef::File(id), ctx.user_id)
            .await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %id,
            directory_id = %destination.id,
            "File moved"
        );
        self.enricher.enrich(moved, ctx.user_id).await
    }

    /// Deletes a file. Owners may delete their files; administrators may
    /// delete any file.
    ///
    /// The row and its grants go first; a failing blob delete is logged and
    /// does not undo the metadata deletion.
    pub async fn delete_file(&self, ctx: &RequestContext, id: FileId) -> AppResult<()> {
        let (file, visibility) = self.resolver.readable_file(ctx, id).await?;
        if !visibility.can_mutate() && !ctx.is_admin() {
            return Err(AppError::forbidden("Only the owner can delete this file"));
        }

        let Some(removed) = self.file_repo.remove(file.id).await? else {
            return Err(AppError::not_found("File not found"));
        };

        if let Err(e) = self.blobs.delete(&removed.stored_blob_id).await {
            warn!(file_id = %id, error = %e, "Blob delete failed, metadata already removed");
        }

        info!(user_id = %ctx.user_id, file_id = %id, "File deleted");
        Ok(())
    }

    /// Shares a file the caller owns with the user behind `email`.
    pub async fn share_file(
        &self,
        ctx: &RequestContext,
        id: FileId,
        email: &str,
    ) -> AppResult<ShareGrant> {
        let file = self.resolver.owned_file(ctx, id).await?;
        let grantee = self.shares.resolve_grantee(email).await?;

        let grant = self
            .share_repo
            .grant(ItemRef::File(file.id), ctx.user_id, grantee.id)
            .await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %id,
            grantee_id = %grantee.id,
            "File shared"
        );
        Ok(grant)
    }

    /// Removes `grantee_id`'s access to a file. Succeeds when the file or
    /// the grant is already gone; returns whether a grant was removed.
    pub async fn unshare_file(
        &self,
        ctx: &RequestContext,
        id: FileId,
        grantee_id: UserId,
    ) -> AppResult<bool> {
        let Some(file) = self.file_repo.find_by_id(id).await? else {
            return Ok(false);
        };
        self.shares.check_unshare(ctx, file.owner_id, grantee_id)?;

        let removed = self.share_repo.revoke(ItemRef::File(id), grantee_id).await?;
        if removed {
            info!(
                user_id = %ctx.user_id,
                file_id = %id,
                grantee_id = %grantee_id,
                "File unshared"
            );
        }
        Ok(removed)
    }

    /// Reads a file for download.
    ///
    /// Inline display is granted only for previewable types; everything
    /// else is offered as an attachment.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        id: FileId,
        inline: bool,
    ) -> AppResult<FileDownload> {
        let (file, _) = self.resolver.readable_file(ctx, id).await?;
        let data = match self.blobs.read(&file.stored_blob_id).await {
            Ok(data) => data,
            Err(e) if e.kind == ErrorKind::NotFound => {
                warn!(file_id = %id, "Blob missing for download");
                return Err(AppError::not_found("File content not found"));
            }
            Err(e) => return Err(e),
        };

        Ok(FileDownload {
            inline: inline && self.enricher.is_previewable(&file.mime_type),
            filename: file.display_name,
            mime_type: file.mime_type,
            data,
        })
    }
}
