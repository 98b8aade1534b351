//! Iterative subtree walks shared by share propagation, revocation, and
//! cascade deletion. All of them run on a caller-supplied connection so they
//! can participate in the caller's transaction.

use std::collections::HashSet;

use sqlx::SqliteConnection;

use cloudvault_core::result::AppResult;
use cloudvault_core::types::{DirectoryId, FileId, UserId};

use super::db_error;

/// Direct child directories of `parent`, optionally restricted to one owner.
pub(crate) async fn child_directory_ids(
    conn: &mut SqliteConnection,
    parent: DirectoryId,
    owner: Option<UserId>,
) -> AppResult<Vec<DirectoryId>> {
    let rows = match owner {
        Some(owner) => {
            sqlx::query_scalar::<_, DirectoryId>(
                "SELECT id FROM directories \
                 WHERE parent_id = ? AND owner_id = ? AND id <> parent_id ORDER BY name ASC",
            )
            .bind(parent)
            .bind(owner)
            .fetch_all(&mut *conn)
            .await
        }
        None => {
            sqlx::query_scalar::<_, DirectoryId>(
                "SELECT id FROM directories \
                 WHERE parent_id = ? AND id <> parent_id ORDER BY name ASC",
            )
            .bind(parent)
            .fetch_all(&mut *conn)
            .await
        }
    };
    rows.map_err(db_error("Failed to list child directories"))
}

/// Files directly inside `directory`, optionally restricted to one owner.
pub(crate) async fn file_ids_in(
    conn: &mut SqliteConnection,
    directory: DirectoryId,
    owner: Option<UserId>,
) -> AppResult<Vec<FileId>> {
    let rows = match owner {
        Some(owner) => {
            sqlx::query_scalar::<_, FileId>(
                "SELECT id FROM files WHERE directory_id = ? AND owner_id = ?",
            )
            .bind(directory)
            .bind(owner)
            .fetch_all(&mut *conn)
            .await
        }
        None => {
            sqlx::query_scalar::<_, FileId>("SELECT id FROM files WHERE directory_id = ?")
                .bind(directory)
                .fetch_all(&mut *conn)
                .await
        }
    };
    rows.map_err(db_error("Failed to list files in directory"))
}

/// `root` and every directory beneath it in depth-first preorder. Each
/// directory appears once even if `parent_id` links form a cycle.
pub(crate) async fn subtree(
    conn: &mut SqliteConnection,
    root: DirectoryId,
    owner: Option<UserId>,
) -> AppResult<Vec<DirectoryId>> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        order.push(current);

        let children = child_directory_ids(conn, current, owner).await?;
        // Reversed so siblings pop in name order.
        stack.extend(
            children
                .into_iter()
                .rev()
                .filter(|child| !visited.contains(child)),
        );
    }

    Ok(order)
}
