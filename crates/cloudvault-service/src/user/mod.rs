//! User provisioning for administrators.

pub mod service;

pub use service::UserService;
