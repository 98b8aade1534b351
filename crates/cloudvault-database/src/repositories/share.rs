//! Share grant repository, including recursive propagation and revocation
//! over directory subtrees.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use cloudvault_core::error::{AppError, ConflictReason, ErrorKind};
use cloudvault_core::result::AppResult;
use cloudvault_core::types::{DirectoryId, ItemRef, ItemType, ShareGrantId, UserId};
use cloudvault_entity::share::ShareGrant;

use super::{db_error, is_unique_violation, walk};

/// Repository for share grants.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: SqlitePool,
}

impl ShareRepository {
    /// Create a new share repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the grant of `item` to `grantee_id`.
    pub async fn find(&self, item: ItemRef, grantee_id: UserId) -> AppResult<Option<ShareGrant>> {
        sqlx::query_as::<_, ShareGrant>(
            "SELECT * FROM shared_items \
             WHERE item_type = ? AND item_id = ? AND shared_with_user_id = ?",
        )
        .bind(item.item_type())
        .bind(item.raw_id())
        .bind(grantee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find share grant"))
    }

    /// Grant `item` to `grantee_id`.
    ///
    /// Fails with [`ConflictReason::SelfShare`] when owner and grantee are the
    /// same user and [`ConflictReason::AlreadyShared`] when the grant exists.
    pub async fn grant(
        &self,
        item: ItemRef,
        owner_id: UserId,
        grantee_id: UserId,
    ) -> AppResult<ShareGrant> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("Failed to acquire connection"))?;
        insert_grant(&mut conn, item, owner_id, grantee_id).await
    }

    /// Remove the grant of `item` to `grantee_id`. Returns whether one existed.
    pub async fn revoke(&self, item: ItemRef, grantee_id: UserId) -> AppResult<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("Failed to acquire connection"))?;
        delete_grant(&mut conn, item, grantee_id).await
    }

    /// Whether `item` is shared with `user_id`.
    pub async fn is_shared_with(&self, item: ItemRef, user_id: UserId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM shared_items \
             WHERE item_type = ? AND item_id = ? AND shared_with_user_id = ?)",
        )
        .bind(item.item_type())
        .bind(item.raw_id())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check share grant"))
    }

    /// Whether `owner_id` has shared `item` with anyone.
    pub async fn is_shared_by(&self, item: ItemRef, owner_id: UserId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM shared_items \
             WHERE item_type = ? AND item_id = ? AND shared_by_user_id = ?)",
        )
        .bind(item.item_type())
        .bind(item.raw_id())
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check outgoing share"))
    }

    /// Grants received by `user_id`, optionally restricted to one item kind.
    pub async fn list_shared_with_user(
        &self,
        user_id: UserId,
        item_type: Option<ItemType>,
    ) -> AppResult<Vec<ShareGrant>> {
        match item_type {
            Some(kind) => {
                sqlx::query_as::<_, ShareGrant>(
                    "SELECT * FROM shared_items WHERE shared_with_user_id = ? AND item_type = ? \
                     ORDER BY created_at DESC",
                )
                .bind(user_id)
                .bind(kind)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ShareGrant>(
                    "SELECT * FROM shared_items WHERE shared_with_user_id = ? \
                     ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_error("Failed to list incoming shares"))
    }

    /// Grants made by `owner_id`, optionally restricted to one item kind.
    pub async fn list_shared_by_user(
        &self,
        owner_id: UserId,
        item_type: Option<ItemType>,
    ) -> AppResult<Vec<ShareGrant>> {
        match item_type {
            Some(kind) => {
                sqlx::query_as::<_, ShareGrant>(
                    "SELECT * FROM shared_items WHERE shared_by_user_id = ? AND item_type = ? \
                     ORDER BY created_at DESC",
                )
                .bind(owner_id)
                .bind(kind)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ShareGrant>(
                    "SELECT * FROM shared_items WHERE shared_by_user_id = ? \
                     ORDER BY created_at DESC",
                )
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_error("Failed to list outgoing shares"))
    }

    /// Everyone `item` is shared with.
    pub async fn list_grantees(&self, item: ItemRef) -> AppResult<Vec<ShareGrant>> {
        sqlx::query_as::<_, ShareGrant>(
            "SELECT * FROM shared_items WHERE item_type = ? AND item_id = ? \
             ORDER BY created_at ASC",
        )
        .bind(item.item_type())
        .bind(item.raw_id())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list grantees"))
    }

    /// Share a directory and everything `owner_id` owns beneath it, in one
    /// transaction.
    ///
    /// The grant on `root` itself is strict (self-share and duplicate grants
    /// fail); grants on descendants are skipped when already present.
    /// Returns the root grant and the number of descendant grants created.
    pub async fn share_directory_tree(
        &self,
        root: DirectoryId,
        owner_id: UserId,
        grantee_id: UserId,
    ) -> AppResult<(ShareGrant, u64)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let grant = insert_grant(&mut tx, ItemRef::Directory(root), owner_id, grantee_id).await?;
        let propagated = propagate(&mut tx, root, owner_id, grantee_id).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit directory share"))?;
        Ok((grant, propagated))
    }

    /// Grant every directory and file owned by `owner_id` beneath `root` to
    /// `grantee_id`, skipping existing grants. The root itself is not
    /// granted. All-or-nothing.
    pub async fn propagate_share_recursively(
        &self,
        root: DirectoryId,
        owner_id: UserId,
        grantee_id: UserId,
    ) -> AppResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let created = propagate(&mut tx, root, owner_id, grantee_id).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit share propagation"))?;
        Ok(created)
    }

    /// Revoke `grantee_id`'s grants on every file and directory in the
    /// subtree of `root`, then on `root` itself, in one transaction.
    ///
    /// The walk follows `parent_id` links regardless of ownership. Returns
    /// the number of grants removed.
    pub async fn revoke_recursively(&self, root: DirectoryId, grantee_id: UserId) -> AppResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let directories = walk::subtree(&mut tx, root, None).await?;
        let mut removed = 0;

        // Deepest first; the root grant goes last.
        for dir in directories.iter().rev() {
            for file in walk::file_ids_in(&mut tx, *dir, None).await? {
                if delete_grant(&mut tx, ItemRef::File(file), grantee_id).await? {
                    removed += 1;
                }
            }
            if delete_grant(&mut tx, ItemRef::Directory(*dir), grantee_id).await? {
                removed += 1;
            }
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit recursive revoke"))?;

        debug!(
            directory_id = %root,
            grantee_id = %grantee_id,
            removed,
            "Revoked directory subtree"
        );
        Ok(removed)
    }

    /// Give `item` every grant `parent` carries, in one transaction.
    ///
    /// Used when an item is created in or moved into a shared directory.
    /// For a directory the grants also reach everything `owner_id` owns
    /// beneath it. Existing grants are kept. Returns the number created.
    pub async fn inherit_grants(
        &self,
        parent: DirectoryId,
        item: ItemRef,
        owner_id: UserId,
    ) -> AppResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let grantees = sqlx::query_scalar::<_, UserId>(
            "SELECT shared_with_user_id FROM shared_items \
             WHERE item_type = ? AND item_id = ? AND shared_with_user_id <> ?",
        )
        .bind(ItemType::Directory)
        .bind(parent.into_uuid())
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Failed to load parent grants"))?;

        let mut created = 0;
        for grantee_id in grantees {
            if insert_grant_if_absent(&mut tx, item, owner_id, grantee_id).await? {
                created += 1;
            }
            if let ItemRef::Directory(dir) = item {
                created += propagate(&mut tx, dir, owner_id, grantee_id).await?;
            }
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit inherited grants"))?;
        Ok(created)
    }
}

async fn insert_grant(
    conn: &mut SqliteConnection,
    item: ItemRef,
    owner_id: UserId,
    grantee_id: UserId,
) -> AppResult<ShareGrant> {
    if owner_id == grantee_id {
        return Err(AppError::conflict(
            ConflictReason::SelfShare,
            "Cannot share an item with yourself",
        ));
    }

    sqlx::query_as::<_, ShareGrant>(
        "INSERT INTO shared_items (id, item_type, item_id, shared_by_user_id, shared_with_user_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(ShareGrantId::new())
    .bind(item.item_type())
    .bind(item.raw_id())
    .bind(owner_id)
    .bind(grantee_id)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::conflict(
                ConflictReason::AlreadyShared,
                "The item is already shared with this user",
            )
        } else {
            AppError::with_source(ErrorKind::Database, "Failed to create share grant", e)
        }
    })
}

async fn insert_grant_if_absent(
    conn: &mut SqliteConnection,
    item: ItemRef,
    owner_id: UserId,
    grantee_id: UserId,
) -> AppResult<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO shared_items (id, item_type, item_id, shared_by_user_id, shared_with_user_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(ShareGrantId::new())
    .bind(item.item_type())
    .bind(item.raw_id())
    .bind(owner_id)
    .bind(grantee_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(db_error("Failed to propagate share grant"))?;
    Ok(result.rows_affected() > 0)
}

async fn delete_grant(
    conn: &mut SqliteConnection,
    item: ItemRef,
    grantee_id: UserId,
) -> AppResult<bool> {
    let result = sqlx::query(
        "DELETE FROM shared_items WHERE item_type = ? AND item_id = ? AND shared_with_user_id = ?",
    )
    .bind(item.item_type())
    .bind(item.raw_id())
    .bind(grantee_id)
    .execute(&mut *conn)
    .await
    .map_err(db_error("Failed to delete share grant"))?;
    Ok(result.rows_affected() > 0)
}

/// Depth-first propagation restricted to items owned by `owner_id`.
async fn propagate(
    conn: &mut SqliteConnection,
    root: DirectoryId,
    owner_id: UserId,
    grantee_id: UserId,
) -> AppResult<u64> {
    if owner_id == grantee_id {
        return Err(AppError::conflict(
            ConflictReason::SelfShare,
            "Cannot share an item with yourself",
        ));
    }

    let directories = walk::subtree(conn, root, Some(owner_id)).await?;
    let mut created = 0;

    for dir in directories {
        if dir != root && insert_grant_if_absent(conn, ItemRef::Directory(dir), owner_id, grantee_id).await? {
            created += 1;
        }
        for file in walk::file_ids_in(conn, dir, Some(owner_id)).await? {
            if insert_grant_if_absent(conn, ItemRef::File(file), owner_id, grantee_id).await? {
                created += 1;
            }
        }
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::testing;
    use crate::repositories::{DirectoryRepository, FileRepository};
    use cloudvault_core::types::FileId;
    use cloudvault_entity::file::CreateFileEntry;

    struct Tree {
        root: DirectoryId,
        a: DirectoryId,
        b: DirectoryId,
        sibling: DirectoryId,
        file_x: FileId,
        file_y: FileId,
    }

    /// Owner root → { Shared → { A → { B, fileX }, fileY }, Sibling }
    async fn build_tree(pool: &SqlitePool, owner: UserId) -> Tree {
        let dirs = DirectoryRepository::new(pool.clone());
        let files = FileRepository::new(pool.clone());
        let home = dirs.get_or_create_root(owner).await.unwrap();
        let root = dirs.create_unique("Shared", home.id, owner).await.unwrap();
        let a = dirs.create_unique("A", root.id, owner).await.unwrap();
        let b = dirs.create_unique("B", a.id, owner).await.unwrap();
        let sibling = dirs.create_unique("Sibling", home.id, owner).await.unwrap();

        let make_file = |name: &str, directory_id| CreateFileEntry {
            display_name: name.to_string(),
            stored_blob_id: uuid::Uuid::new_v4().to_string(),
            mime_type: "text/plain".to_string(),
            byte_size: 1,
            directory_id,
            owner_id: owner,
        };
        let file_x = files.create(&make_file("x.txt", a.id)).await.unwrap();
        let file_y = files.create(&make_file("y.txt", root.id)).await.unwrap();

        Tree {
            root: root.id,
            a: a.id,
            b: b.id,
            sibling: sibling.id,
            file_x: file_x.id,
            file_y: file_y.id,
        }
    }

    #[tokio::test]
    async fn test_grant_conflicts() {
        let pool = testing::pool().await;
        let owner = testing::user(&pool, "owner@example.com").await;
        let grantee = testing::user(&pool, "grantee@example.com").await;
        let shares = ShareRepository::new(pool);
        let item = ItemRef::File(FileId::new());

        let err = shares.grant(item, owner, owner).await.unwrap_err();
        assert!(err.is_conflict(ConflictReason::SelfShare));

        shares.grant(item, owner, grantee).await.unwrap();
        let err = shares.grant(item, owner, grantee).await.unwrap_err();
        assert!(err.is_conflict(ConflictReason::AlreadyShared));

        assert!(shares.is_shared_with(item, grantee).await.unwrap());
        assert!(shares.is_shared_by(item, owner).await.unwrap());
        assert!(shares.revoke(item, grantee).await.unwrap());
        assert!(!shares.revoke(item, grantee).await.unwrap());
    }

    #[tokio::test]
    async fn test_share_tree_then_revoke() {
        let pool = testing::pool().await;
        let owner = testing::user(&pool, "owner@example.com").await;
        let grantee = testing::user(&pool, "grantee@example.com").await;
        let tree = build_tree(&pool, owner).await;
        let shares = ShareRepository::new(pool);

        let (grant, propagated) = shares
            .share_directory_tree(tree.root, owner, grantee)
            .await
            .unwrap();
        assert_eq!(grant.item(), ItemRef::Directory(tree.root));
        assert_eq!(propagated, 4);

        let covered = [
            ItemRef::Directory(tree.root),
            ItemRef::Directory(tree.a),
            ItemRef::Directory(tree.b),
            ItemRef::File(tree.file_x),
            ItemRef::File(tree.file_y),
        ];
        for item in covered {
            assert!(shares.is_shared_with(item, grantee).await.unwrap(), "{item}");
        }
        assert!(!shares
            .is_shared_with(ItemRef::Directory(tree.sibling), grantee)
            .await
            .unwrap());

        let removed = shares.revoke_recursively(tree.root, grantee).await.unwrap();
        assert_eq!(removed, 5);
        for item in covered {
            assert!(!shares.is_shared_with(item, grantee).await.unwrap(), "{item}");
        }
        assert!(shares.list_shared_with_user(grantee, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_tree_share_leaves_nothing_behind() {
        let pool = testing::pool().await;
        let owner = testing::user(&pool, "owner@example.com").await;
        let grantee = testing::user(&pool, "grantee@example.com").await;
        let tree = build_tree(&pool, owner).await;
        let shares = ShareRepository::new(pool);

        shares
            .grant(ItemRef::Directory(tree.root), owner, grantee)
            .await
            .unwrap();
        let err = shares
            .share_directory_tree(tree.root, owner, grantee)
            .await
            .unwrap_err();
        assert!(err.is_conflict(ConflictReason::AlreadyShared));

        // Only the manual root grant exists; nothing was propagated.
        let incoming = shares.list_shared_with_user(grantee, None).await.unwrap();
        assert_eq!(incoming.len(), 1);
    }

    #[tokio::test]
    async fn test_propagation_is_idempotent() {
        let pool = testing::pool().await;
        let owner = testing::user(&pool, "owner@example.com").await;
        let grantee = testing::user(&pool, "grantee@example.com").await;
        let tree = build_tree(&pool, owner).await;
        let shares = ShareRepository::new(pool);

        assert_eq!(
            shares
                .propagate_share_recursively(tree.root, owner, grantee)
                .await
                .unwrap(),
            4
        );
        assert_eq!(
            shares
                .propagate_share_recursively(tree.root, owner, grantee)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            shares
                .list_shared_with_user(grantee, Some(ItemType::File))
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(shares.list_shared_by_user(owner, None).await.unwrap().len(), 4);
        assert!(shares
            .list_grantees(ItemRef::Directory(tree.root))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_inherit_grants_reaches_moved_subtree() {
        let pool = testing::pool().await;
        let owner = testing::user(&pool, "owner@example.com").await;
        let grantee = testing::user(&pool, "grantee@example.com").await;
        let tree = build_tree(&pool, owner).await;
        let shares = ShareRepository::new(pool);

        // Nothing to inherit from an unshared parent.
        let created = shares
            .inherit_grants(tree.sibling, ItemRef::Directory(tree.a), owner)
            .await
            .unwrap();
        assert_eq!(created, 0);

        shares
            .grant(ItemRef::Directory(tree.sibling), owner, grantee)
            .await
            .unwrap();
        let created = shares
            .inherit_grants(tree.sibling, ItemRef::Directory(tree.a), owner)
            .await
            .unwrap();
        assert_eq!(created, 3);
        for item in [
            ItemRef::Directory(tree.a),
            ItemRef::Directory(tree.b),
            ItemRef::File(tree.file_x),
        ] {
            assert!(shares.is_shared_with(item, grantee).await.unwrap(), "{item}");
        }
        assert!(!shares
            .is_shared_with(ItemRef::File(tree.file_y), grantee)
            .await
            .unwrap());
    }
}
