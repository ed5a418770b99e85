//! Request logging middleware.

pub mod layer;
pub mod redaction;

pub use layer::{LoggingLayer, LoggingMiddleware, RequestLogConfig};
pub use redaction::{format_headers, redact_headers};
