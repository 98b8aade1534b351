//! # cloudvault-core
//!
//! Core crate for CloudVault. Contains the unified error system, typed
//! identifiers, directory and item references, configuration schemas,
//! and the blob store trait.
//!
//! This crate has **no** internal dependencies on other CloudVault crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ConflictReason, ErrorKind};
pub use result::AppResult;
