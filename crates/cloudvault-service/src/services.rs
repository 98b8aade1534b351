//! Wiring of repositories and services into one bundle.

use std::sync::Arc;

use cloudvault_core::config::AppConfig;
use cloudvault_core::traits::BlobStore;
use cloudvault_database::DatabasePool;
use cloudvault_database::repositories::{
    DirectoryRepository, FileRepository, ShareRepository, UserRepository,
};

use crate::access::AccessResolver;
use crate::directory::{ArchiveExporter, DirectoryService, TreeService};
use crate::file::{FileEnricher, FileService, UploadService};
use crate::share::ShareService;
use crate::user::UserService;

/// Every service, built over one pool and one blob store.
#[derive(Debug, Clone)]
pub struct Services {
    /// Access resolver shared by the facades.
    pub resolver: Arc<AccessResolver>,
    /// Directory facade.
    pub directories: Arc<DirectoryService>,
    /// File facade.
    pub files: Arc<FileService>,
    /// Uploads.
    pub uploads: Arc<UploadService>,
    /// Share listings.
    pub shares: Arc<ShareService>,
    /// User provisioning.
    pub users: Arc<UserService>,
    /// Tree inspection.
    pub tree: Arc<TreeService>,
}

impl Services {
    /// Builds all repositories and services.
    pub fn new(db: &DatabasePool, blobs: Arc<dyn BlobStore>, config: &AppConfig) -> Self {
        let pool = db.pool().clone();

        let dir_repo = Arc::new(
            DirectoryRepository::new(pool.clone()).with_root_name(config.tree.root_name.clone()),
        );
        let file_repo = Arc::new(FileRepository::new(pool.clone()));
        let share_repo = Arc::new(ShareRepository::new(pool.clone()));
        let user_repo = Arc::new(UserRepository::new(pool));

        let resolver = Arc::new(AccessResolver::new(
            Arc::clone(&dir_repo),
            Arc::clone(&file_repo),
            Arc::clone(&share_repo),
            &config.tree,
        ));
        let enricher = Arc::new(FileEnricher::new(
            Arc::clone(&blobs),
            Arc::clone(&share_repo),
            config.preview.clone(),
        ));
        let shares = Arc::new(ShareService::new(
            Arc::clone(&user_repo),
            Arc::clone(&share_repo),
            Arc::clone(&dir_repo),
            Arc::clone(&file_repo),
            Arc::clone(&resolver),
        ));
        let archiver = Arc::new(ArchiveExporter::new(
            Arc::clone(&dir_repo),
            Arc::clone(&file_repo),
            Arc::clone(&blobs),
        ));

        let directories = Arc::new(DirectoryService::new(
            Arc::clone(&dir_repo),
            Arc::clone(&file_repo),
            Arc::clone(&share_repo),
            Arc::clone(&resolver),
            Arc::clone(&shares),
            Arc::clone(&enricher),
            archiver,
            Arc::clone(&blobs),
        ));
        let files = Arc::new(FileService::new(
            Arc::clone(&file_repo),
            Arc::clone(&dir_repo),
            Arc::clone(&share_repo),
            Arc::clone(&resolver),
            Arc::clone(&shares),
            Arc::clone(&blobs),
            Arc::clone(&enricher),
        ));
        let uploads = Arc::new(UploadService::new(
            Arc::clone(&file_repo),
            Arc::clone(&dir_repo),
            Arc::clone(&share_repo),
            blobs,
            enricher,
            config.storage.clone(),
        ));
        let users = Arc::new(UserService::new(user_repo));
        let tree = Arc::new(TreeService::new(dir_repo, file_repo));

        Self {
            resolver,
            directories,
            files,
            uploads,
            shares,
            users,
            tree,
        }
    }
}
