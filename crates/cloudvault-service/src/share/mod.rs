//! Share services.

pub mod service;

pub use service::{GranteeView, OutgoingShareView, ShareService};
