//! Middleware for the HMS API server.

pub mod auth;
pub mod authz;
pub mod cors;
pub mod logging;
pub mod rate_limit;

pub use auth::{Auth, AuthLayer, AuthMiddleware, AuthUser, Claims, MaybeAuth, TokenDecoder};
pub use authz::{log_authz, AuthzLayer, AuthzMiddleware};
pub use cors::cors_layer;
pub use logging::{LoggingLayer, LoggingMiddleware, RequestLogConfig};
pub use rate_limit::{
    client_ip, InMemoryStore, KeyStrategy, RateLimitLayer, RateLimitMiddleware, RateLimitPolicy,
    RateLimitStore,
};
