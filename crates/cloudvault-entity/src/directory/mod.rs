//! Directory domain entities.

pub mod model;
pub mod path;

pub use model::{CreateDirectory, Directory, MAX_NAME_LEN};
pub use path::PathSegment;
