//! Directory repository: persistence and structural queries over the
//! per-user directory forest.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use cloudvault_core::error::{AppError, ConflictReason, ErrorKind};
use cloudvault_core::result::AppResult;
use cloudvault_core::types::{DirectoryId, DirectoryRef, UserId};
use cloudvault_entity::directory::{CreateDirectory, Directory, MAX_NAME_LEN};
use cloudvault_entity::file::FileEntry;

use super::{db_error, is_unique_violation, walk};

/// How often `create_unique` re-reads sibling names after losing a race.
const CREATE_UNIQUE_ATTEMPTS: usize = 5;

const DEFAULT_ROOT_NAME: &str = "Root";

/// Repository for directory CRUD and tree queries.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: SqlitePool,
    root_name: String,
}

/// Everything removed by [`DirectoryRepository::delete_subtree`].
#[derive(Debug, Clone, Default)]
pub struct SubtreeRemoval {
    /// Removed directories, the subtree root first.
    pub directories: Vec<DirectoryId>,
    /// Removed file rows; their blobs still need deleting.
    pub files: Vec<FileEntry>,
    /// Number of share grants removed along with the items.
    pub grants: u64,
}

impl DirectoryRepository {
    /// Create a new directory repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            root_name: DEFAULT_ROOT_NAME.to_string(),
        }
    }

    /// Use a different name for lazily created roots.
    pub fn with_root_name(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    /// Find a directory by ID.
    pub async fn find_by_id(&self, id: DirectoryId) -> AppResult<Option<Directory>> {
        sqlx::query_as::<_, Directory>("SELECT * FROM directories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find directory"))
    }

    /// The unique root of a user, if it was ever created.
    pub async fn find_root(&self, owner_id: UserId) -> AppResult<Option<Directory>> {
        sqlx::query_as::<_, Directory>(
            "SELECT * FROM directories WHERE owner_id = ? AND parent_id IS NULL",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find root directory"))
    }

    /// Return the user's root, creating it on first access.
    ///
    /// Concurrent first calls for the same user converge on one row: the
    /// insert is ignored when the partial unique index on roots already
    /// holds an entry.
    pub async fn get_or_create_root(&self, owner_id: UserId) -> AppResult<Directory> {
        if let Some(root) = self.find_root(owner_id).await? {
            return Ok(root);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO directories (id, name, parent_id, owner_id, created_at) \
             VALUES (?, ?, NULL, ?, ?)",
        )
        .bind(DirectoryId::new())
        .bind(&self.root_name)
        .bind(owner_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to create root directory"))?
        .rows_affected();

        let root = sqlx::query_as::<_, Directory>(
            "SELECT * FROM directories WHERE owner_id = ? AND parent_id IS NULL",
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to read root directory"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit root creation"))?;

        if inserted > 0 {
            info!(owner_id = %owner_id, directory_id = %root.id, "Root directory created");
        }
        Ok(root)
    }

    /// Resolve where a new item may be created for `owner_id`.
    ///
    /// The root sentinel resolves to the owner's root. A concrete id must
    /// exist and be owned by `owner_id`; shared access never allows
    /// creating inside a directory.
    pub async fn resolve_parent(
        &self,
        requested: DirectoryRef,
        owner_id: UserId,
    ) -> AppResult<Directory> {
        match requested {
            DirectoryRef::Root => self.get_or_create_root(owner_id).await,
            DirectoryRef::Id(id) => self
                .find_by_id(id)
                .await?
                .filter(|dir| dir.is_owned_by(owner_id))
                .ok_or_else(|| AppError::not_found("Parent directory not found")),
        }
    }

    /// Find an owner's child directory by exact name.
    pub async fn find_child_by_name(
        &self,
        parent_id: DirectoryId,
        owner_id: UserId,
        name: &str,
    ) -> AppResult<Option<Directory>> {
        sqlx::query_as::<_, Directory>(
            "SELECT * FROM directories WHERE parent_id = ? AND owner_id = ? AND name = ?",
        )
        .bind(parent_id)
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find child directory"))
    }

    /// Insert a directory with exactly the given name.
    pub async fn create(&self, data: &CreateDirectory) -> AppResult<Directory> {
        sqlx::query_as::<_, Directory>(
            "INSERT INTO directories (id, name, parent_id, owner_id, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(DirectoryId::new())
        .bind(&data.name)
        .bind(data.parent_id)
        .bind(data.owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(
                    ConflictReason::NameTaken,
                    format!("A directory named '{}' already exists here", data.name),
                )
            } else {
                AppError::with_source(
                    ErrorKind::Database,
                    "Failed to create directory",
                    e,
                )
            }
        })
    }

    /// Create a child directory, suffixing ` (1)`, ` (2)`, … until the name
    /// is free among the owner's siblings.
    pub async fn create_unique(
        &self,
        base_name: &str,
        parent_id: DirectoryId,
        owner_id: UserId,
    ) -> AppResult<Directory> {
        for attempt in 1..=CREATE_UNIQUE_ATTEMPTS {
            let taken = self.sibling_names(parent_id, owner_id).await?;
            let name = first_free_name(base_name, &taken);

            let data = CreateDirectory {
                name,
                parent_id: Some(parent_id),
                owner_id,
            };
            match self.create(&data).await {
                Ok(dir) => return Ok(dir),
                Err(e) if e.is_conflict(ConflictReason::NameTaken) => {
                    debug!(
                        attempt,
                        parent_id = %parent_id,
                        name = %data.name,
                        "Sibling name claimed concurrently, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::conflict(
            ConflictReason::NameTaken,
            format!("Could not find a free name for '{base_name}'"),
        ))
    }

    /// Rename a directory owned by `owner_id`.
    ///
    /// Renaming to the current name, or to a name a sibling already holds,
    /// is reported as [`ConflictReason::NoOp`]. Renames are never
    /// deduplicated.
    pub async fn rename(
        &self,
        id: DirectoryId,
        new_name: &str,
        owner_id: UserId,
    ) -> AppResult<Directory> {
        let dir = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Directory {id} not found")))?;

        if !dir.is_owned_by(owner_id) {
            return Err(AppError::forbidden("Only the owner can rename a directory"));
        }
        if dir.name == new_name {
            return Err(AppError::conflict(
                ConflictReason::NoOp,
                "The directory already has that name",
            ));
        }

        sqlx::query_as::<_, Directory>("UPDATE directories SET name = ? WHERE id = ? RETURNING *")
            .bind(new_name)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict(
                        ConflictReason::NoOp,
                        format!("A directory named '{new_name}' already exists here"),
                    )
                } else {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to rename directory",
                        e,
                    )
                }
            })
    }

    /// Re-point a directory at a new parent.
    ///
    /// No ownership or cycle checks happen here; callers verify both before
    /// moving. Returns whether a row was updated.
    pub async fn move_directory(
        &self,
        id: DirectoryId,
        new_parent_id: DirectoryId,
    ) -> AppResult<bool> {
        let result = sqlx::query("UPDATE directories SET parent_id = ? WHERE id = ?")
            .bind(new_parent_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict(
                        ConflictReason::NameTaken,
                        "The destination already contains a directory with that name",
                    )
                } else {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to move directory",
                        e,
                    )
                }
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a single directory row. Children, files and grants are left
    /// untouched; see [`Self::delete_subtree`] for the cascading variant.
    pub async fn delete(&self, id: DirectoryId, owner_id: UserId, as_admin: bool) -> AppResult<bool> {
        let result = if as_admin {
            sqlx::query("DELETE FROM directories WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
        } else {
            sqlx::query("DELETE FROM directories WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(owner_id)
                .execute(&self.pool)
                .await
        }
        .map_err(db_error("Failed to delete directory"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a directory with every descendant directory, every file inside
    /// them, and every share grant referencing any of those items, in one
    /// transaction. Blobs of the returned files are the caller's to remove.
    pub async fn delete_subtree(&self, root: DirectoryId) -> AppResult<SubtreeRemoval> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let directories = walk::subtree(&mut *tx, root, None).await?;

        let mut files = Vec::new();
        for dir in &directories {
            let in_dir =
                sqlx::query_as::<_, FileEntry>("SELECT * FROM files WHERE directory_id = ?")
                    .bind(dir)
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(db_error("Failed to list files for deletion"))?;
            files.extend(in_dir);
        }

        let mut grants = 0;
        for file in &files {
            grants += sqlx::query("DELETE FROM shared_items WHERE item_type = 'file' AND item_id = ?")
                .bind(file.id)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to delete file grants"))?
                .rows_affected();
        }

        // Deepest directories first.
        for dir in directories.iter().rev() {
            grants += sqlx::query(
                "DELETE FROM shared_items WHERE item_type = 'directory' AND item_id = ?",
            )
            .bind(dir)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete directory grants"))?
            .rows_affected();

            sqlx::query("DELETE FROM files WHERE directory_id = ?")
                .bind(dir)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to delete files"))?;

            sqlx::query("DELETE FROM directories WHERE id = ?")
                .bind(dir)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to delete directory"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit subtree deletion"))?;

        Ok(SubtreeRemoval {
            directories,
            files,
            grants,
        })
    }

    /// Children of `parent_id` that `viewer_id` may see: those the viewer
    /// owns plus those shared with them directly. `None` lists every child.
    /// Ordered by name; a self-parented row never lists itself.
    pub async fn list_children(
        &self,
        parent_id: DirectoryId,
        viewer_id: Option<UserId>,
    ) -> AppResult<Vec<Directory>> {
        sqlx::query_as::<_, Directory>(
            "SELECT c.* FROM directories c \
             WHERE c.parent_id = ?1 AND c.id <> ?1 \
               AND (?2 IS NULL \
                    OR c.owner_id = ?2 \
                    OR EXISTS (SELECT 1 FROM shared_items s \
                               WHERE s.item_type = 'directory' AND s.item_id = c.id \
                                 AND s.shared_with_user_id = ?2)) \
             ORDER BY c.name ASC",
        )
        .bind(parent_id)
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list child directories"))
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    ///
    /// The chain stops after `max_depth` hops or as soon as a directory
    /// repeats, so corrupted `parent_id` cycles cannot loop forever.
    pub async fn find_ancestors(
        &self,
        id: DirectoryId,
        max_depth: usize,
    ) -> AppResult<Vec<Directory>> {
        let rows = sqlx::query_as::<_, Directory>(
            "WITH RECURSIVE chain(id, parent_id, depth) AS ( \
                SELECT id, parent_id, 0 FROM directories WHERE id = ?1 \
                UNION ALL \
                SELECT d.id, d.parent_id, c.depth + 1 FROM directories d \
                INNER JOIN chain c ON d.id = c.parent_id \
                WHERE c.depth < ?2 \
             ) \
             SELECT d.* FROM chain c INNER JOIN directories d ON d.id = c.id \
             WHERE c.depth > 0 ORDER BY c.depth ASC",
        )
        .bind(id)
        .bind(i64::try_from(max_depth).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find ancestors"))?;

        let mut seen = HashSet::from([id]);
        Ok(rows
            .into_iter()
            .take_while(|dir| seen.insert(dir.id))
            .collect())
    }

    /// Whether `ancestor` appears anywhere on the parent chain of `node`.
    ///
    /// Unbounded but cycle-safe: the recursive `UNION` discards repeated ids.
    pub async fn is_ancestor_of(
        &self,
        ancestor: DirectoryId,
        node: DirectoryId,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "WITH RECURSIVE chain(id) AS ( \
                SELECT parent_id FROM directories WHERE id = ?1 \
                UNION \
                SELECT d.parent_id FROM directories d INNER JOIN chain c ON d.id = c.id \
                WHERE d.parent_id IS NOT NULL \
             ) \
             SELECT EXISTS (SELECT 1 FROM chain WHERE id = ?2)",
        )
        .bind(node)
        .bind(ancestor)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check directory ancestry"))
    }

    /// Directories shared with `viewer_id` whose parent is not itself shared
    /// with them: the entry points of each shared tree.
    pub async fn list_shared_top_level(&self, viewer_id: UserId) -> AppResult<Vec<Directory>> {
        sqlx::query_as::<_, Directory>(
            "SELECT d.* FROM directories d \
             INNER JOIN shared_items s ON s.item_type = 'directory' AND s.item_id = d.id \
             WHERE s.shared_with_user_id = ?1 AND d.owner_id <> ?1 \
               AND (d.parent_id IS NULL \
                    OR NOT EXISTS (SELECT 1 FROM shared_items p \
                                   WHERE p.item_type = 'directory' AND p.item_id = d.parent_id \
                                     AND p.shared_with_user_id = ?1)) \
             ORDER BY d.name ASC",
        )
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list shared directories"))
    }

    /// Every directory shared with `viewer_id`.
    pub async fn list_shared_with(&self, viewer_id: UserId) -> AppResult<Vec<Directory>> {
        sqlx::query_as::<_, Directory>(
            "SELECT d.* FROM directories d \
             INNER JOIN shared_items s ON s.item_type = 'directory' AND s.item_id = d.id \
             WHERE s.shared_with_user_id = ? ORDER BY d.name ASC",
        )
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list directories shared with user"))
    }

    /// Count all directories owned by a user, root included.
    pub async fn count_for_owner(&self, owner_id: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM directories WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count directories"))?;
        Ok(count as u64)
    }

    async fn sibling_names(
        &self,
        parent_id: DirectoryId,
        owner_id: UserId,
    ) -> AppResult<HashSet<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM directories WHERE parent_id = ? AND owner_id = ?",
        )
        .bind(parent_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list sibling names"))?;
        Ok(names.into_iter().collect())
    }
}

/// First of `base`, `base (1)`, `base (2)`, … absent from `taken`, shortened
/// so the result stays within [`MAX_NAME_LEN`] characters.
pub(crate) fn first_free_name(base: &str, taken: &HashSet<String>) -> String {
    let base: String = base.chars().take(MAX_NAME_LEN).collect();
    if !taken.contains(&base) {
        return base;
    }

    (1u64..)
        .map(|n| {
            let suffix = format!(" ({n})");
            let room = MAX_NAME_LEN.saturating_sub(suffix.chars().count());
            let stem: String = base.chars().take(room).collect();
            format!("{stem}{suffix}")
        })
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}
