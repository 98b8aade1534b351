//! ZIP export of a directory subtree.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use cloudvault_core::error::{AppError, ErrorKind};
use cloudvault_core::result::AppResult;
use cloudvault_core::traits::BlobStore;
use cloudvault_core::types::{DirectoryId, UserId};
use cloudvault_database::repositories::{DirectoryRepository, FileRepository};
use cloudvault_entity::directory::Directory;
use cloudvault_storage::{sanitize_entry_name, unique_entry_name};

/// Builds in-memory ZIP archives of what a viewer can see below a directory.
#[derive(Debug, Clone)]
pub struct ArchiveExporter {
    /// Directory repository.
    dir_repo: Arc<DirectoryRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Blob store.
    blobs: Arc<dyn BlobStore>,
}

/// Counts reported after an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    /// Folder entries written.
    pub directories: usize,
    /// File entries written.
    pub files: usize,
    /// Files skipped because their blob is gone.
    pub missing_blobs: usize,
}

impl ArchiveExporter {
    /// Creates a new exporter.
    pub fn new(
        dir_repo: Arc<DirectoryRepository>,
        file_repo: Arc<FileRepository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            dir_repo,
            file_repo,
            blobs,
        }
    }

    /// Export `root` and everything below it that `viewer_id` may see;
    /// `None` exports everything.
    ///
    /// The archive holds one top-level folder named `top_name`. Traversal is
    /// depth-first and never visits a directory twice.
    pub async fn export(
        &self,
        root: &Directory,
        viewer_id: Option<UserId>,
        top_name: &str,
    ) -> AppResult<(Bytes, ArchiveStats)> {
        let options = SimpleFileOptions::default();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut stats = ArchiveStats::default();

        let mut visited: HashSet<DirectoryId> = HashSet::new();
        let mut stack = vec![(root.id, format!("{}/", sanitize_entry_name(top_name)))];

        while let Some((dir_id, prefix)) = stack.pop() {
            if !visited.insert(dir_id) {
                continue;
            }

            writer
                .add_directory(prefix.as_str(), options)
                .map_err(zip_error)?;
            stats.directories += 1;

            // Names already used inside this archive folder.
            let mut taken = HashSet::new();

            let children = self.dir_repo.list_children(dir_id, viewer_id).await?;
            let mut pending = Vec::with_capacity(children.len());
            for child in children {
                if visited.contains(&child.id) {
                    continue;
                }
                let name = unique_entry_name(&sanitize_entry_name(&child.name), &mut taken);
                pending.push((child.id, format!("{prefix}{name}/")));
            }

            let files = self
                .file_repo
                .list_in_directory(dir_id, viewer_id, false)
                .await?;
            for file in files {
                let data = match self.blobs.read(&file.stored_blob_id).await {
                    Ok(data) => data,
                    Err(e) if e.kind == ErrorKind::NotFound => {
                        warn!(file_id = %file.id, "Skipping file with missing blob in archive");
                        stats.missing_blobs += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                let name = unique_entry_name(&sanitize_entry_name(&file.display_name), &mut taken);
                writer
                    .start_file(format!("{prefix}{name}"), options)
                    .map_err(zip_error)?;
                writer.write_all(&data)?;
                stats.files += 1;
            }

            // Reversed so subdirectories are visited in name order.
            stack.extend(pending.into_iter().rev());
        }

        let cursor = writer.finish().map_err(zip_error)?;
        debug!(
            directory_id = %root.id,
            directories = stats.directories,
            files = stats.files,
            "Archive built"
        );
        Ok((Bytes::from(cursor.into_inner()), stats))
    }
}

fn zip_error(e: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Storage, "Failed to build archive", e)
}
