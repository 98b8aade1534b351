//! Directory facade: create, rename, move, delete, share, list and export.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use cloudvault_core::error::{AppError, ConflictReason, ErrorKind};
use cloudvault_core::result::AppResult;
use cloudvault_core::traits::BlobStore;
use cloudvault_core::types::{DirectoryId, DirectoryRef, UserId};
use cloudvault_database::repositories::{DirectoryRepository, FileRepository, ShareRepository};
use cloudvault_entity::access::Visibility;
use cloudvault_entity::directory::{Directory, PathSegment};
use cloudvault_entity::share::ShareGrant;
use cloudvault_storage::sanitize_entry_name;

use super::archive::ArchiveExporter;
use crate::access::AccessResolver;
use crate::context::RequestContext;
use crate::file::{FileEnricher, FileView};
use crate::share::ShareService;
use crate::validation::validate_name;

/// A subdirectory as presented to one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryView {
    /// Directory ID.
    pub id: DirectoryId,
    /// Name.
    pub name: String,
    /// Owner.
    pub owner_id: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// The viewer reaches this directory through a share.
    pub is_shared: bool,
    /// The viewer owns the directory and has shared it with someone.
    pub shared_by_me: bool,
}

/// Everything needed to render one directory page.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    /// The directory being viewed.
    pub directory: Directory,
    /// How the viewer reaches it.
    pub visibility: Visibility,
    /// Where "up" leads; `None` at the viewer's own root.
    pub parent: Option<DirectoryRef>,
    /// Breadcrumbs from the home segment down to `directory`.
    pub path: Vec<PathSegment>,
    /// Visible children, by name.
    pub subdirectories: Vec<DirectoryView>,
    /// Entry points of trees shared with the viewer; only filled at the
    /// viewer's own root.
    pub shared_directories: Vec<DirectoryView>,
    /// Visible files, newest first.
    pub files: Vec<FileView>,
}

/// Items other users shared with the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SharedWithMe {
    /// Top-level shared directories.
    pub directories: Vec<DirectoryView>,
    /// Directly shared files.
    pub files: Vec<FileView>,
}

/// What a cascading delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    /// Directories removed, the target included.
    pub directories: usize,
    /// Files removed.
    pub files: usize,
    /// Share grants removed.
    pub grants: u64,
    /// Blobs that could not be deleted from storage.
    pub blob_failures: usize,
}

/// Result of sharing a directory tree.
#[derive(Debug, Clone, Serialize)]
pub struct ShareOutcome {
    /// The grant on the directory itself.
    pub grant: ShareGrant,
    /// Email of the grantee.
    pub grantee_email: String,
    /// Grants created on descendants.
    pub propagated: u64,
}

/// A ready-to-send ZIP archive.
#[derive(Debug, Clone)]
pub struct Archive {
    /// Suggested download name, ending in `.zip`.
    pub filename: String,
    /// Archive bytes.
    pub data: Bytes,
}

/// Externally visible directory operations.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    /// Directory repository.
    dir_repo: Arc<DirectoryRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Share repository.
    share_repo: Arc<ShareRepository>,
    /// Access resolver.
    resolver: Arc<AccessResolver>,
    /// Share bookkeeping.
    shares: Arc<ShareService>,
    /// File listing enrichment.
    enricher: Arc<FileEnricher>,
    /// ZIP export.
    archiver: Arc<ArchiveExporter>,
    /// Blob store, for cascade cleanup.
    blobs: Arc<dyn BlobStore>,
}

impl DirectoryService {
    /// Creates a new directory service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dir_repo: Arc<DirectoryRepository>,
        file_repo: Arc<FileRepository>,
        share_repo: Arc<ShareRepository>,
        resolver: Arc<AccessResolver>,
        shares: Arc<ShareService>,
        enricher: Arc<FileEnricher>,
        archiver: Arc<ArchiveExporter>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            dir_repo,
            file_repo,
            share_repo,
            resolver,
            shares,
            enricher,
            archiver,
            blobs,
        }
    }

    /// Creates a directory under `parent`, which must be the caller's root
    /// or a directory they own. A taken name gets a ` (n)` suffix, and the
    /// new directory is shared with everyone `parent` is shared with.
    pub async fn add_directory(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent: DirectoryRef,
    ) -> AppResult<Directory> {
        let name = validate_name(name)?;
        let parent = self
            .dir_repo
            .resolve_parent(parent, ctx.user_id)
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => {
                    AppError::forbidden("You cannot create directories here")
                }
                _ => e,
            })?;

        let dir = self
            .dir_repo
            .create_unique(&name, parent.id, ctx.user_id)
            .await?;
        self.inherit_grants(parent.id, &dir, ctx.user_id).await?;

        info!(
            user_id = %ctx.user_id,
            directory_id = %dir.id,
            parent_id = %parent.id,
            name = %dir.name,
            "Directory created"
        );
        Ok(dir)
    }

    /// Renames a directory the caller owns.
    pub async fn rename_directory(
        &self,
        ctx: &RequestContext,
        id: DirectoryId,
        new_name: &str,
    ) -> AppResult<Directory> {
        let new_name = validate_name(new_name)?;
        self.resolver.owned_directory(ctx, id).await?;

        let dir = self.dir_repo.rename(id, &new_name, ctx.user_id).await?;

        info!(user_id = %ctx.user_id, directory_id = %id, name = %dir.name, "Directory renamed");
        Ok(dir)
    }

    /// Moves a directory the caller owns under another directory they own.
    ///
    /// The moved subtree keeps its grants and gains those of the new
    /// parent. Moving a directory into itself or any of its descendants fails with
    /// [`ConflictReason::SelfParent`]. Moving into the current parent
    /// returns the directory unchanged.
    pub async fn move_directory(
        &self,
        ctx: &RequestContext,
        id: DirectoryId,
        target: DirectoryRef,
    ) -> AppResult<Directory> {
        let dir = self.resolver.owned_directory(ctx, id).await?;
        if dir.is_root() {
            return Err(AppError::validation("The root directory cannot be moved"));
        }
        if target == DirectoryRef::Id(id) {
            return Err(self_parent());
        }

        let destination = match target {
            DirectoryRef::Root => self.dir_repo.get_or_create_root(ctx.user_id).await?,
            DirectoryRef::Id(target_id) => self.resolver.owned_directory(ctx, target_id).await?,
        };
        if dir.parent_id == Some(destination.id) {
            return Ok(dir);
        }
        if self.dir_repo.is_ancestor_of(id, destination.id).await? {
            return Err(self_parent());
        }

        if !self.dir_repo.move_directory(id, destination.id).await? {
            return Err(AppError::not_found("Directory not found"));
        }
        let moved = self
            .dir_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Directory not found"))?;
        self.inherit_grants(destination.id, &moved, ctx.user_id).await?;

        info!(
            user_id = %ctx.user_id,
            directory_id = %id,
            parent_id = %destination.id,
            "Directory moved"
        );
        Ok(moved)
    }

    /// Deletes a directory with everything below it.
    ///
    /// Owners may delete their directories; administrators may delete any.
    /// Metadata goes in one transaction; blobs are removed afterwards and a
    /// failing blob delete is only logged.
    pub async fn delete_directory(
        &self,
        ctx: &RequestContext,
        target: DirectoryRef,
    ) -> AppResult<DeleteSummary> {
        let dir = match target {
            DirectoryRef::Root => self
                .dir_repo
                .find_root(ctx.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Directory not found"))?,
            DirectoryRef::Id(id) => {
                let (dir, visibility) = self.resolver.readable_directory(ctx, id).await?;
                if !visibility.can_mutate() && !ctx.is_admin() {
                    return Err(AppError::forbidden("Only the owner can delete this directory"));
                }
                dir
            }
        };

        let removal = self.dir_repo.delete_subtree(dir.id).await?;

        let mut blob_failures = 0;
        for file in &removal.files {
            if let Err(e) = self.blobs.delete(&file.stored_blob_id).await {
                warn!(
                    file_id = %file.id,
                    error = %e,
                    "Blob delete failed, metadata already removed"
                );
                blob_failures += 1;
            }
        }

        let summary = DeleteSummary {
            directories: removal.directories.len(),
            files: removal.files.len(),
            grants: removal.grants,
            blob_failures,
        };
        info!(
            user_id = %ctx.user_id,
            directory_id = %dir.id,
            directories = summary.directories,
            files = summary.files,
            grants = summary.grants,
            "Directory deleted"
        );
        Ok(summary)
    }

    /// Shares a directory the caller owns, and everything they own below
    /// it, with the user behind `email`.
    pub async fn share_directory(
        &self,
        ctx: &RequestContext,
        id: DirectoryId,
        email: &str,
    ) -> AppResult<ShareOutcome> {
        let dir = self.resolver.owned_directory(ctx, id).await?;
        let grantee = self.shares.resolve_grantee(email).await?;

        let (grant, propagated) = self
            .share_repo
            .share_directory_tree(dir.id, ctx.user_id, grantee.id)
            .await?;

        info!(
            user_id = %ctx.user_id,
            directory_id = %id,
            grantee_id = %grantee.id,
            propagated,
            "Directory shared"
        );
        Ok(ShareOutcome {
            grant,
            grantee_email: grantee.email,
            propagated,
        })
    }

    /// Removes `grantee_id`'s access to a directory and everything below it.
    ///
    /// Idempotent: a missing directory or absent grants yield zero removed.
    pub async fn unshare_directory(
        &self,
        ctx: &RequestContext,
        id: DirectoryId,
        grantee_id: UserId,
    ) -> AppResult<u64> {
        let Some(dir) = self.dir_repo.find_by_id(id).await? else {
            return Ok(0);
        };
        self.shares.check_unshare(ctx, dir.owner_id, grantee_id)?;

        let removed = self.share_repo.revoke_recursively(id, grantee_id).await?;

        info!(
            user_id = %ctx.user_id,
            directory_id = %id,
            grantee_id = %grantee_id,
            removed,
            "Directory unshared"
        );
        Ok(removed)
    }

    /// Lists a directory for the caller.
    ///
    /// At the caller's own root the listing also carries the entry points
    /// of directory trees shared with them and files shared with them that
    /// are not reachable by browsing a shared directory.
    pub async fn list_directory(
        &self,
        ctx: &RequestContext,
        target: DirectoryRef,
    ) -> AppResult<DirectoryListing> {
        let (directory, visibility) = match target {
            DirectoryRef::Root => (
                self.dir_repo.get_or_create_root(ctx.user_id).await?,
                Visibility::Owned,
            ),
            DirectoryRef::Id(id) => self.resolver.readable_directory(ctx, id).await?,
        };
        let at_home = directory.is_root() && directory.is_owned_by(ctx.user_id);
        let viewer = listing_viewer(ctx, visibility);

        let parent = self.resolver.safe_parent(&directory, ctx.user_id).await?;
        let path = self
            .resolver
            .build_breadcrumb_path(&directory, ctx.user_id)
            .await?;

        let children = self
            .dir_repo
            .list_children(directory.id, viewer)
            .await?;
        let subdirectories = self.views(children, ctx.user_id).await?;

        let shared_directories = if at_home {
            let shared = self.dir_repo.list_shared_top_level(ctx.user_id).await?;
            self.views(shared, ctx.user_id).await?
        } else {
            Vec::new()
        };

        let files = self
            .file_repo
            .list_in_directory(directory.id, viewer, at_home)
            .await?;
        let files = self.enricher.enrich_all(files, ctx.user_id).await?;

        Ok(DirectoryListing {
            directory,
            visibility,
            parent,
            path,
            subdirectories,
            shared_directories,
            files,
        })
    }

    /// Top-level directories and individual files shared with the caller.
    pub async fn list_shared_with_me(&self, ctx: &RequestContext) -> AppResult<SharedWithMe> {
        let directories = self.dir_repo.list_shared_top_level(ctx.user_id).await?;
        let files = self.file_repo.list_shared_with(ctx.user_id).await?;

        Ok(SharedWithMe {
            directories: self.views(directories, ctx.user_id).await?,
            files: self.enricher.enrich_all(files, ctx.user_id).await?,
        })
    }

    /// Exports a readable directory as a ZIP archive.
    pub async fn download_archive(
        &self,
        ctx: &RequestContext,
        target: DirectoryRef,
    ) -> AppResult<Archive> {
        let (dir, visibility) = match target {
            DirectoryRef::Root => (
                self.dir_repo.get_or_create_root(ctx.user_id).await?,
                Visibility::Owned,
            ),
            DirectoryRef::Id(id) => self.resolver.readable_directory(ctx, id).await?,
        };

        let top_name = if dir.is_root() && dir.is_owned_by(ctx.user_id) {
            self.resolver.home_label().to_string()
        } else {
            dir.name.clone()
        };

        let (data, stats) = self
            .archiver
            .export(&dir, listing_viewer(ctx, visibility), &top_name)
            .await?;

        info!(
            user_id = %ctx.user_id,
            directory_id = %dir.id,
            files = stats.files,
            missing_blobs = stats.missing_blobs,
            bytes = data.len(),
            "Directory archive exported"
        );
        Ok(Archive {
            filename: format!("{}.zip", sanitize_entry_name(&top_name)),
            data,
        })
    }

    async fn inherit_grants(
        &self,
        parent_id: DirectoryId,
        dir: &Directory,
        owner_id: UserId,
    ) -> AppResult<()> {
        let inherited = self
            .share_repo
            .inherit_grants(parent_id, dir.item_ref(), owner_id)
            .await?;
        if inherited > 0 {
            debug!(directory_id = %dir.id, inherited, "Directory inherited parent grants");
        }
        Ok(())
    }

    async fn views(&self, dirs: Vec<Directory>, viewer_id: UserId) -> AppResult<Vec<DirectoryView>> {
        let mut views = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let owned = dir.is_owned_by(viewer_id);
            let shared_by_me = owned && self.share_repo.is_shared_by(dir.item_ref(), viewer_id).await?;
            views.push(DirectoryView {
                id: dir.id,
                name: dir.name,
                owner_id: dir.owner_id,
                created_at: dir.created_at,
                is_shared: !owned,
                shared_by_me,
            });
        }
        Ok(views)
    }
}

/// Whose view a listing is filtered to. Administrators reading a directory
/// they have no grant on see all of it.
fn listing_viewer(ctx: &RequestContext, visibility: Visibility) -> Option<UserId> {
    visibility.can_read().then_some(ctx.user_id)
}

fn self_parent() -> AppError {
    AppError::conflict(
        ConflictReason::SelfParent,
        "A directory cannot be moved into itself or one of its descendants",
    )
}
