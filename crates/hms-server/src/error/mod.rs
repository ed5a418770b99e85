//! Error handling for the HMS API server.

pub mod context;
pub mod response;
pub mod types;

pub use context::{conflict, invalid_reference, invalid_transition, ErrorContext};
pub use types::{ApiError, ApiResult};
