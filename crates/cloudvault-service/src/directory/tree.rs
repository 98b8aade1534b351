//! Flat, depth-annotated views of a user's directory tree.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use cloudvault_core::result::AppResult;
use cloudvault_core::types::{DirectoryId, UserId};
use cloudvault_database::repositories::{DirectoryRepository, FileRepository};
use cloudvault_entity::directory::Directory;

/// One directory in a pre-order tree listing.
#[derive(Debug, Clone, Serialize)]
pub struct TreeEntry {
    /// Distance from the listed root; the root itself is 0.
    pub depth: usize,
    /// The directory.
    pub directory: Directory,
    /// Files directly inside the directory.
    pub file_count: usize,
}

/// Walks directory trees for inspection.
#[derive(Debug, Clone)]
pub struct TreeService {
    /// Directory repository.
    dir_repo: Arc<DirectoryRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(dir_repo: Arc<DirectoryRepository>, file_repo: Arc<FileRepository>) -> Self {
        Self {
            dir_repo,
            file_repo,
        }
    }

    /// The whole tree of `owner_id`, starting at their root, in pre-order
    /// with children sorted by name. Returns an empty list when the user
    /// has no root yet.
    pub async fn owner_tree(&self, owner_id: UserId, max_depth: usize) -> AppResult<Vec<TreeEntry>> {
        let Some(root) = self.dir_repo.find_root(owner_id).await? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        let mut visited: HashSet<DirectoryId> = HashSet::new();
        let mut stack = vec![(root, 0usize)];

        while let Some((dir, depth)) = stack.pop() {
            if !visited.insert(dir.id) {
                continue;
            }

            let file_count = self
                .file_repo
                .list_in_directory(dir.id, Some(owner_id), false)
                .await?
                .into_iter()
                .filter(|f| f.is_owned_by(owner_id))
                .count();

            if depth < max_depth {
                let children = self.dir_repo.list_children(dir.id, Some(owner_id)).await?;
                stack.extend(
                    children
                        .into_iter()
                        .filter(|c| c.is_owned_by(owner_id))
                        .rev()
                        .map(|c| (c, depth + 1)),
                );
            }

            entries.push(TreeEntry {
                depth,
                directory: dir,
                file_count,
            });
        }

        Ok(entries)
    }
}
