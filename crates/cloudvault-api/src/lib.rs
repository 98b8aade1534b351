//! # cloudvault-api
//!
//! HTTP API layer for CloudVault built on Axum.
//!
//! Provides the REST endpoints, middleware (CORS, compression, request
//! logging, body limits), the gateway identity extractor, DTOs, and the
//! mapping from domain errors to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
