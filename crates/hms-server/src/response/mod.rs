//! Response types and utilities.

pub mod builder;
pub mod pagination;
pub mod types;

pub use builder::{created, ok, paginated, with_message, ResponseBuilder};
pub use pagination::*;
pub use types::*;