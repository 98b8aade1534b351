//! # cloudvault-database
//!
//! SQLite connection management, embedded migrations, and the concrete
//! repositories behind the directory tree, file entries, share grants,
//! and users.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
