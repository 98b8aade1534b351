//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use bytes::Bytes;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use cloudvault_core::config::AppConfig;
use cloudvault_core::error::AppError;
use cloudvault_core::result::AppResult;
use cloudvault_core::traits::BlobStore;
use cloudvault_core::types::{DirectoryRef, UserId};
use cloudvault_database::DatabasePool;
use cloudvault_service::file::{FileView, UploadRequest};
use cloudvault_service::{RequestContext, Services};
use cloudvault_storage::LocalBlobStore;

/// Local blob store whose deletes can be switched to fail.
#[derive(Debug)]
pub struct FlakyBlobStore {
    inner: LocalBlobStore,
    fail_deletes: AtomicBool,
}

impl FlakyBlobStore {
    /// Make every following delete fail (or succeed again).
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    fn provider_type(&self) -> &str {
        "flaky-local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn exists(&self, id: &str) -> AppResult<bool> {
        self.inner.exists(id).await
    }

    async fn write(&self, id: &str, data: Bytes) -> AppResult<()> {
        self.inner.write(id, data).await
    }

    async fn read(&self, id: &str) -> AppResult<Bytes> {
        self.inner.read(id).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::storage(format!("Injected delete failure for {id}")));
        }
        self.inner.delete(id).await
    }

    async fn size(&self, id: &str) -> AppResult<Option<u64>> {
        self.inner.size(id).await
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum app for making test requests
    pub router: Router,
    /// All services over the same database and blob store
    pub services: Services,
    /// Database pool for direct queries
    pub db: DatabasePool,
    /// Blob store shared by the services and the router
    pub blobs: Arc<FlakyBlobStore>,
    /// Application config
    pub config: AppConfig,
    _dir: TempDir,
}

impl TestApp {
    /// Create a new test application with default settings
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a new test application; the blob root is always a fresh
    /// temporary directory and the database is in memory.
    pub async fn with_config(mut config: AppConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        config.storage.root_path = dir.path().to_string_lossy().into_owned();
        config.database.url = "sqlite::memory:".to_string();

        let db = DatabasePool::in_memory()
            .await
            .expect("Failed to open test database");

        let inner = LocalBlobStore::new(&config.storage)
            .await
            .expect("Failed to init blob store");
        let blobs = Arc::new(FlakyBlobStore {
            inner,
            fail_deletes: AtomicBool::new(false),
        });
        let dyn_blobs: Arc<dyn BlobStore> = blobs.clone();

        let services = Services::new(&db, Arc::clone(&dyn_blobs), &config);
        let state = cloudvault_api::AppState::new(
            Arc::new(config.clone()),
            db.clone(),
            dyn_blobs,
            &services,
        );
        let router = cloudvault_api::build_app(state);

        Self {
            router,
            services,
            db,
            blobs,
            config,
            _dir: dir,
        }
    }

    /// Create a regular user and return their request context
    pub async fn user(&self, email: &str) -> RequestContext {
        let user = self
            .services
            .users
            .create_user(email, None, false)
            .await
            .expect("Failed to create test user");
        RequestContext::new(user.id)
    }

    /// Create an administrator and return their request context
    pub async fn admin(&self, email: &str) -> RequestContext {
        let user = self
            .services
            .users
            .create_user(email, None, true)
            .await
            .expect("Failed to create test admin");
        RequestContext::admin(user.id)
    }

    /// Create a directory through the service layer
    pub async fn mkdir(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent: DirectoryRef,
    ) -> cloudvault_entity::directory::Directory {
        self.services
            .directories
            .add_directory(ctx, name, parent)
            .await
            .expect("Failed to create directory")
    }

    /// Upload a file through the service layer
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        directory: DirectoryRef,
        name: &str,
        body: &[u8],
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
                    data: Bytes::copy_from_slice(body),
                },
            )
            .await
            .expect("Failed to upload file")
    }

    /// Make a JSON HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        user: Option<UserId>,
        body: Option<Value>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(user) = user {
            req = req.header("x-user-id", user.to_string());
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Make a raw-body upload request to the test app
    pub async fn upload_request(
        &self,
        path: &str,
        user: UserId,
        content_type: &str,
        body: Vec<u8>,
    ) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("x-user-id", user.to_string())
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when the body is not JSON
    pub body: Value,
    /// Raw body bytes
    pub bytes: Bytes,
}

impl TestResponse {
    /// The `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The machine-readable error code of a failure envelope
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    /// A header as a string, empty when absent
    pub fn header(&self, name: &str) -> String {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}
