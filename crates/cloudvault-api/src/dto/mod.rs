//! Request and response DTOs.

pub mod request;
pub mod response;

pub use request::validate_body;
pub use response::ApiResponse;
