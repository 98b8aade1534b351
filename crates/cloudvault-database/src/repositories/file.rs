//! File entry repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;

use cloudvault_core::error::{AppError, ConflictReason};
use cloudvault_core::result::AppResult;
use cloudvault_core::types::{DirectoryId, FileId, UserId};
use cloudvault_entity::file::{CreateFileEntry, FileEntry};

use super::db_error;

/// Repository for file metadata.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: FileId) -> AppResult<Option<FileEntry>> {
        sqlx::query_as::<_, FileEntry>("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find file"))
    }

    /// Record a new file.
    pub async fn create(&self, data: &CreateFileEntry) -> AppResult<FileEntry> {
        sqlx::query_as::<_, FileEntry>(
            "INSERT INTO files (id, filename, stored_name, mime_type, size, directory_id, owner_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(FileId::new())
        .bind(&data.display_name)
        .bind(&data.stored_blob_id)
        .bind(&data.mime_type)
        .bind(data.byte_size)
        .bind(data.directory_id)
        .bind(data.owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create file"))
    }

    /// Rename a file owned by `owner_id`.
    pub async fn rename(&self, id: FileId, new_name: &str, owner_id: UserId) -> AppResult<FileEntry> {
        let file = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;

        if !file.is_owned_by(owner_id) {
            return Err(AppError::forbidden("Only the owner can rename a file"));
        }
        if file.display_name == new_name {
            return Err(AppError::conflict(
                ConflictReason::NoOp,
                "The file already has that name",
            ));
        }

        sqlx::query_as::<_, FileEntry>("UPDATE files SET filename = ? WHERE id = ? RETURNING *")
            .bind(new_name)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to rename file"))
    }

    /// Re-point a file at another directory. Callers check ownership first.
    pub async fn move_file(&self, id: FileId, directory_id: DirectoryId) -> AppResult<bool> {
        let result = sqlx::query("UPDATE files SET directory_id = ? WHERE id = ?")
            .bind(directory_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to move file"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a file row together with its share grants.
    ///
    /// Returns the removed row so the caller can delete its blob, or `None`
    /// when the file did not exist.
    pub async fn remove(&self, id: FileId) -> AppResult<Option<FileEntry>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let removed = sqlx::query_as::<_, FileEntry>("DELETE FROM files WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to delete file"))?;

        if removed.is_some() {
            sqlx::query("DELETE FROM shared_items WHERE item_type = 'file' AND item_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to delete file grants"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit file deletion"))?;
        Ok(removed)
    }

    /// Files in `directory_id` visible to `viewer_id`, newest first.
    ///
    /// A file is listed when the viewer uploaded it or when it is shared
    /// with the viewer directly; `None` lists every file. With
    /// `include_root_shares` (the viewer is looking at their own root) the
    /// listing also surfaces files shared with the viewer whose directory
    /// cannot be browsed through a shared parent.
    pub async fn list_in_directory(
        &self,
        directory_id: DirectoryId,
        viewer_id: Option<UserId>,
        include_root_shares: bool,
    ) -> AppResult<Vec<FileEntry>> {
        sqlx::query_as::<_, FileEntry>(
            "SELECT f.* FROM files f \
             WHERE f.directory_id = ?1 \
               AND (?2 IS NULL \
                    OR f.owner_id = ?2 \
                    OR EXISTS (SELECT 1 FROM shared_items s \
                               WHERE s.item_type = 'file' AND s.item_id = f.id \
                                 AND s.shared_with_user_id = ?2)) \
             UNION \
             SELECT f.* FROM files f \
             INNER JOIN directories d ON d.id = f.directory_id \
             WHERE ?3 AND ?2 IS NOT NULL AND f.owner_id <> ?2 \
               AND EXISTS (SELECT 1 FROM shared_items s \
                           WHERE s.item_type = 'file' AND s.item_id = f.id \
                             AND s.shared_with_user_id = ?2) \
               AND (d.parent_id IS NULL \
                    OR NOT EXISTS (SELECT 1 FROM shared_items sd \
                                   WHERE sd.item_type = 'directory' AND sd.item_id = d.id \
                                     AND sd.shared_with_user_id = ?2) \
                    OR NOT EXISTS (SELECT 1 FROM shared_items sp \
                                   WHERE sp.item_type = 'directory' AND sp.item_id = d.parent_id \
                                     AND sp.shared_with_user_id = ?2)) \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(directory_id)
        .bind(viewer_id)
        .bind(include_root_shares)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list files in directory"))
    }

    /// Every file shared with `viewer_id`, newest first.
    pub async fn list_shared_with(&self, viewer_id: UserId) -> AppResult<Vec<FileEntry>> {
        sqlx::query_as::<_, FileEntry>(
            "SELECT f.* FROM files f \
             INNER JOIN shared_items s ON s.item_type = 'file' AND s.item_id = f.id \
             WHERE s.shared_with_user_id = ? \
             ORDER BY f.created_at DESC, f.id DESC",
        )
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list files shared with user"))
    }

    /// Whether a stored blob name is already referenced by a file row.
    pub async fn stored_name_exists(&self, stored_name: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM files WHERE stored_name = ?)")
            .bind(stored_name)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to check stored name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::testing;
    use crate::repositories::DirectoryRepository;

    fn upload(name: &str, directory_id: DirectoryId, owner_id: UserId) -> CreateFileEntry {
        CreateFileEntry {
            display_name: name.to_string(),
            stored_blob_id: uuid::Uuid::new_v4().to_string(),
            mime_type: "text/plain".to_string(),
            byte_size: 3,
            directory_id,
            owner_id,
        }
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let pool = testing::pool().await;
        let owner = testing::user(&pool, "owner@example.com").await;
        let dirs = DirectoryRepository::new(pool.clone());
        let files = FileRepository::new(pool);
        let root = dirs.get_or_create_root(owner).await.unwrap();

        let first = files.create(&upload("a.txt", root.id, owner)).await.unwrap();
        let second = files.create(&upload("b.txt", root.id, owner)).await.unwrap();

        let listed: Vec<_> = files
            .list_in_directory(root.id, Some(owner), true)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(listed, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_rename_and_remove() {
        let pool = testing::pool().await;
        let owner = testing::user(&pool, "owner@example.com").await;
        let other = testing::user(&pool, "other@example.com").await;
        let dirs = DirectoryRepository::new(pool.clone());
        let files = FileRepository::new(pool);
        let root = dirs.get_or_create_root(owner).await.unwrap();
        let file = files.create(&upload("a.txt", root.id, owner)).await.unwrap();

        let err = files.rename(file.id, "a.txt", owner).await.unwrap_err();
        assert!(err.is_conflict(ConflictReason::NoOp));
        let err = files.rename(file.id, "b.txt", other).await.unwrap_err();
        assert_eq!(err.kind, cloudvault_core::ErrorKind::Authorization);

        let renamed = files.rename(file.id, "b.txt", owner).await.unwrap();
        assert_eq!(renamed.display_name, "b.txt");
        assert!(files.stored_name_exists(&file.stored_blob_id).await.unwrap());

        let removed = files.remove(file.id).await.unwrap().unwrap();
        assert_eq!(removed.id, file.id);
        assert!(files.remove(file.id).await.unwrap().is_none());
        assert!(files.find_by_id(file.id).await.unwrap().is_none());
    }
}
