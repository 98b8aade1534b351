//! Access resolver over ownership and share grants.
//!
//! Resolution order:
//! 1. Owner: full rights.
//! 2. Direct grant: read access to the item.
//! 3. Otherwise no access, reported exactly like a missing item.
//!
//! Grants on an ancestor confer nothing by themselves. Sharing a directory
//! writes a grant on every item below it, and items created in or moved
//! into a shared directory inherit its grants, so revoking a subtree
//! always takes effect even while an ancestor stays shared.
//!
//! Administrators bypass read checks; mutations still go through the
//! ownership checks of each facade.

use std::sync::Arc;

use tracing::debug;

use cloudvault_core::config::TreeConfig;
use cloudvault_core::error::AppError;
use cloudvault_core::result::AppResult;
use cloudvault_core::types::{DirectoryId, DirectoryRef, FileId, ItemRef, UserId};
use cloudvault_database::repositories::{DirectoryRepository, FileRepository, ShareRepository};
use cloudvault_entity::access::Visibility;
use cloudvault_entity::directory::{Directory, PathSegment};
use cloudvault_entity::file::FileEntry;

use crate::context::RequestContext;

/// Resolves visibility, ownership, safe parents and breadcrumbs.
#[derive(Debug, Clone)]
pub struct AccessResolver {
    /// Directory repository.
    dir_repo: Arc<DirectoryRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Share repository.
    share_repo: Arc<ShareRepository>,
    /// Safety bound on upward walks.
    max_walk_depth: usize,
    /// Label of the synthetic home breadcrumb.
    home_label: String,
}

impl AccessResolver {
    /// Creates a new access resolver.
    pub fn new(
        dir_repo: Arc<DirectoryRepository>,
        file_repo: Arc<FileRepository>,
        share_repo: Arc<ShareRepository>,
        tree: &TreeConfig,
    ) -> Self {
        Self {
            dir_repo,
            file_repo,
            share_repo,
            max_walk_depth: tree.max_walk_depth,
            home_label: tree.home_label.clone(),
        }
    }

    /// Label of the synthetic home breadcrumb.
    pub fn home_label(&self) -> &str {
        &self.home_label
    }

    /// Owner or direct grant. Missing items are never accessible.
    pub async fn can_access(&self, item: ItemRef, user_id: UserId) -> AppResult<bool> {
        let owner = match item {
            ItemRef::Directory(id) => self.dir_repo.find_by_id(id).await?.map(|d| d.owner_id),
            ItemRef::File(id) => self.file_repo.find_by_id(id).await?.map(|f| f.owner_id),
        };
        match owner {
            None => Ok(false),
            Some(owner) if owner == user_id => Ok(true),
            Some(_) => self.share_repo.is_shared_with(item, user_id).await,
        }
    }

    /// How `dir` appears to `user_id`.
    pub async fn directory_visibility(
        &self,
        dir: &Directory,
        user_id: UserId,
    ) -> AppResult<Visibility> {
        self.item_visibility(dir.owner_id, dir.item_ref(), user_id).await
    }

    /// How `file` appears to `user_id`.
    pub async fn file_visibility(&self, file: &FileEntry, user_id: UserId) -> AppResult<Visibility> {
        self.item_visibility(file.owner_id, ItemRef::File(file.id), user_id)
            .await
    }

    async fn item_visibility(
        &self,
        owner_id: UserId,
        item: ItemRef,
        user_id: UserId,
    ) -> AppResult<Visibility> {
        if owner_id == user_id {
            Ok(Visibility::Owned)
        } else if self.share_repo.is_shared_with(item, user_id).await? {
            Ok(Visibility::SharedDirect)
        } else {
            Ok(Visibility::NoAccess)
        }
    }

    /// Load a directory the caller may read.
    pub async fn readable_directory(
        &self,
        ctx: &RequestContext,
        id: DirectoryId,
    ) -> AppResult<(Directory, Visibility)> {
        let dir = self
            .dir_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Directory not found"))?;

        let visibility = self.directory_visibility(&dir, ctx.user_id).await?;
        if !visibility.can_read() && !ctx.is_admin() {
            debug!(user_id = %ctx.user_id, directory_id = %id, "Directory hidden from user");
            return Err(AppError::not_found("Directory not found"));
        }
        Ok((dir, visibility))
    }

    /// Load a file the caller may read.
    pub async fn readable_file(
        &self,
        ctx: &RequestContext,
        id: FileId,
    ) -> AppResult<(FileEntry, Visibility)> {
        let file = self
            .file_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        let visibility = self.file_visibility(&file, ctx.user_id).await?;
        if !visibility.can_read() && !ctx.is_admin() {
            debug!(user_id = %ctx.user_id, file_id = %id, "File hidden from user");
            return Err(AppError::not_found("File not found"));
        }
        Ok((file, visibility))
    }

    /// Load a directory the caller owns.
    ///
    /// NotFound when it is absent or invisible to the caller; Forbidden when
    /// the caller can see it but does not own it.
    pub async fn owned_directory(&self, ctx: &RequestContext, id: DirectoryId) -> AppResult<Directory> {
        let (dir, visibility) = self.readable_directory(ctx, id).await?;
        if visibility.can_mutate() {
            Ok(dir)
        } else {
            Err(AppError::forbidden("Only the owner can modify this directory"))
        }
    }

    /// Load a file the caller owns. Same error rules as
    /// [`Self::owned_directory`].
    pub async fn owned_file(&self, ctx: &RequestContext, id: FileId) -> AppResult<FileEntry> {
        let (file, visibility) = self.readable_file(ctx, id).await?;
        if visibility.can_mutate() {
            Ok(file)
        } else {
            Err(AppError::forbidden("Only the owner can modify this file"))
        }
    }

    /// First ancestor of `id` that `user_id` can access, nearest first.
    ///
    /// `None` means no ancestor is accessible and the caller should fall back
    /// to the user's own root.
    pub async fn find_accessible_ancestor(
        &self,
        id: DirectoryId,
        user_id: UserId,
    ) -> AppResult<Option<Directory>> {
        for ancestor in self.dir_repo.find_ancestors(id, self.max_walk_depth).await? {
            if self.can_access_loaded(&ancestor, user_id).await? {
                return Ok(Some(ancestor));
            }
        }
        Ok(None)
    }

    /// Where "up" leads from `dir` for `user_id`: the nearest accessible
    /// ancestor, or the user's root. `None` for the user's own root.
    pub async fn safe_parent(&self, dir: &Directory, user_id: UserId) -> AppResult<Option<DirectoryRef>> {
        if dir.is_root() && dir.is_owned_by(user_id) {
            return Ok(None);
        }
        Ok(Some(
            match self.find_accessible_ancestor(dir.id, user_id).await? {
                Some(ancestor) if ancestor.is_root() && ancestor.is_owned_by(user_id) => {
                    DirectoryRef::Root
                }
                Some(ancestor) => DirectoryRef::Id(ancestor.id),
                None => DirectoryRef::Root,
            },
        ))
    }

    /// Breadcrumb trail from the home segment down to `dir`.
    ///
    /// Starts at `dir` and walks upward while the user can access each
    /// ancestor, stopping at the first one they cannot. A synthetic home
    /// segment is prepended unless the trail already starts at the user's
    /// own root.
    pub async fn build_breadcrumb_path(
        &self,
        dir: &Directory,
        user_id: UserId,
    ) -> AppResult<Vec<PathSegment>> {
        let mut segments = vec![self.segment(dir, user_id)];

        if !(dir.is_root() && dir.is_owned_by(user_id)) {
            for ancestor in self.dir_repo.find_ancestors(dir.id, self.max_walk_depth).await? {
                if !self.can_access_loaded(&ancestor, user_id).await? {
                    break;
                }
                let at_home = ancestor.is_root() && ancestor.is_owned_by(user_id);
                segments.push(self.segment(&ancestor, user_id));
                if at_home {
                    break;
                }
            }
        }

        segments.reverse();
        if segments.first().map(|s| s.target) != Some(DirectoryRef::Root) {
            segments.insert(0, PathSegment::home(&self.home_label));
        }
        Ok(segments)
    }

    fn segment(&self, dir: &Directory, user_id: UserId) -> PathSegment {
        if dir.is_root() && dir.is_owned_by(user_id) {
            PathSegment::home(&self.home_label)
        } else {
            PathSegment {
                target: DirectoryRef::Id(dir.id),
                name: dir.name.clone(),
                is_shared: !dir.is_owned_by(user_id),
            }
        }
    }

    async fn can_access_loaded(&self, dir: &Directory, user_id: UserId) -> AppResult<bool> {
        if dir.is_owned_by(user_id) {
            return Ok(true);
        }
        self.share_repo.is_shared_with(dir.item_ref(), user_id).await
    }
}
