//! # cloudvault-entity
//!
//! Domain entity models for CloudVault. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod access;
pub mod directory;
pub mod file;
pub mod share;
pub mod user;
