//! Role-based authorization middleware.

pub mod audit;
pub mod layer;

pub use audit::{log_authz, AuthzAuditEvent};
pub use layer::{AuthzLayer, AuthzMiddleware};
