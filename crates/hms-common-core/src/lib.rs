//! HMS common core types.
//!
//! Strongly-typed document identifiers and the account [`Role`] live here so
//! that the server, its tests, and any future tooling agree on one wire
//! representation.

pub mod id;
pub mod role;

pub use id::*;
pub use role::{Role, RoleParseError};
