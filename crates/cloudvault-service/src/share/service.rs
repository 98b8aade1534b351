//! Share bookkeeping: grantee lookup, unshare policy and grant listings.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cloudvault_core::error::AppError;
use cloudvault_core::result::AppResult;
use cloudvault_core::types::{ItemRef, UserId};
use cloudvault_database::repositories::{
    DirectoryRepository, FileRepository, ShareRepository, UserRepository,
};
use cloudvault_entity::share::ShareGrant;
use cloudvault_entity::user::User;

use crate::access::AccessResolver;
use crate::context::RequestContext;
use crate::validation::validate_email;

/// Someone an item is shared with.
#[derive(Debug, Clone, Serialize)]
pub struct GranteeView {
    /// Grantee ID.
    pub user_id: UserId,
    /// Grantee email.
    pub email: String,
    /// Grantee display name.
    pub display_name: Option<String>,
    /// When the grant was made.
    pub shared_at: DateTime<Utc>,
}

/// A grant the caller made.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingShareView {
    /// The shared item.
    pub item: ItemRef,
    /// Item name.
    pub name: String,
    /// Who received it.
    pub grantee_id: UserId,
    /// The grantee's email, when the user record still exists.
    pub grantee_email: Option<String>,
    /// When the grant was made.
    pub shared_at: DateTime<Utc>,
}

/// Grantee resolution and share listings.
#[derive(Debug, Clone)]
pub struct ShareService {
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Share repository.
    share_repo: Arc<ShareRepository>,
    /// Directory repository.
    dir_repo: Arc<DirectoryRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Access resolver.
    resolver: Arc<AccessResolver>,
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        user_repo: Arc<UserRepository>,
        share_repo: Arc<ShareRepository>,
        dir_repo: Arc<DirectoryRepository>,
        file_repo: Arc<FileRepository>,
        resolver: Arc<AccessResolver>,
    ) -> Self {
        Self {
            user_repo,
            share_repo,
            dir_repo,
            file_repo,
            resolver,
        }
    }

    /// Find the user an item is being shared with.
    ///
    /// A malformed address is a validation error; an unknown one is
    /// NotFound.
    pub async fn resolve_grantee(&self, email: &str) -> AppResult<User> {
        let email = validate_email(email)?;
        self.user_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No user with email {email}")))
    }

    /// Decide whether `ctx` may remove `grantee_id`'s grant on an item
    /// owned by `owner_id`.
    ///
    /// The owner may revoke anyone; a grantee may only drop their own
    /// access.
    pub fn check_unshare(
        &self,
        ctx: &RequestContext,
        owner_id: UserId,
        grantee_id: UserId,
    ) -> AppResult<()> {
        if ctx.user_id == owner_id || ctx.user_id == grantee_id {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Only the owner or the grantee can remove this share",
            ))
        }
    }

    /// Everyone the caller's item is shared with.
    pub async fn list_grantees(&self, ctx: &RequestContext, item: ItemRef) -> AppResult<Vec<GranteeView>> {
        match item {
            ItemRef::Directory(id) => {
                self.resolver.owned_directory(ctx, id).await?;
            }
            ItemRef::File(id) => {
                self.resolver.owned_file(ctx, id).await?;
            }
        }

        let grants = self.share_repo.list_grantees(item).await?;
        let mut users = UserLookup::new(&self.user_repo);
        let mut views = Vec::with_capacity(grants.len());
        for grant in grants {
            if let Some(user) = users.get(grant.grantee_id).await? {
                views.push(GranteeView {
                    user_id: user.id,
                    email: user.email,
                    display_name: user.display_name,
                    shared_at: grant.created_at,
                });
            }
        }
        Ok(views)
    }

    /// Grants the caller made. Grants whose item no longer exists are
    /// skipped.
    pub async fn list_outgoing(&self, ctx: &RequestContext) -> AppResult<Vec<OutgoingShareView>> {
        let grants = self
            .share_repo
            .list_shared_by_user(ctx.user_id, None)
            .await?;

        let mut users = UserLookup::new(&self.user_repo);
        let mut views = Vec::with_capacity(grants.len());
        for grant in grants {
            let Some(name) = self.item_name(&grant).await? else {
                continue;
            };
            views.push(OutgoingShareView {
                item: grant.item(),
                name,
                grantee_id: grant.grantee_id,
                grantee_email: users.get(grant.grantee_id).await?.map(|u| u.email),
                shared_at: grant.created_at,
            });
        }
        Ok(views)
    }

    async fn item_name(&self, grant: &ShareGrant) -> AppResult<Option<String>> {
        Ok(match grant.item() {
            ItemRef::Directory(id) => self.dir_repo.find_by_id(id).await?.map(|d| d.name),
            ItemRef::File(id) => self.file_repo.find_by_id(id).await?.map(|f| f.display_name),
        })
    }
}

/// Per-call memo of user lookups.
struct UserLookup<'a> {
    repo: &'a UserRepository,
    seen: HashMap<UserId, Option<User>>,
}

impl<'a> UserLookup<'a> {
    fn new(repo: &'a UserRepository) -> Self {
        Self {
            repo,
            seen: HashMap::new(),
        }
    }

    async fn get(&mut self, id: UserId) -> AppResult<Option<User>> {
        if let Some(user) = self.seen.get(&id) {
            return Ok(user.clone());
        }
        let user = self.repo.find_by_id(id).await?;
        self.seen.insert(id, user.clone());
        Ok(user)
    }
}
