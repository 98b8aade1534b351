//! Shared fixtures for service unit tests.

use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempDir;

use cloudvault_core::config::AppConfig;
use cloudvault_core::traits::BlobStore;
use cloudvault_core::types::DirectoryRef;
use cloudvault_database::DatabasePool;
use cloudvault_storage::LocalBlobStore;

use crate::context::RequestContext;
use crate::file::{FileView, UploadRequest};
use crate::services::Services;

pub struct Fixture {
    pub services: Services,
    _dir: TempDir,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = DatabasePool::in_memory().await.unwrap();
        let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::open(dir.path(), true).await.unwrap());
        let services = Services::new(&db, blobs, &AppConfig::default());
        Self {
            services,
            _dir: dir,
        }
    }

    pub async fn user(&self, email: &str) -> RequestContext {
        let user = self
            .services
            .users
            .create_user(email, None, false)
            .await
            .unwrap();
        RequestContext::new(user.id)
    }

    pub async fn upload(
        &self,
        ctx: &RequestContext,
        directory: DirectoryRef,
        name: &str,
        body: &'static [u8],
    ) -> FileView {
        self.services
            .uploads
            .upload(
                ctx,
                UploadRequest {
                    directory,
                    name: name.to_string(),
                    relative_path: None,
                    mime_type: None,
                    data: Bytes::from_static(body),
                },
            )
            .await
            .unwrap()
    }
}
