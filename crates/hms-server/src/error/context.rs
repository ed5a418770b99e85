//! Error context utilities.

use super::types::ApiError;

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Add context to an error, converting to ApiError.
    fn context(self, context: impl Into<String>) -> Result<T, ApiError>;

    /// Add context for not found errors.
    fn not_found(self, resource: impl Into<String>) -> Result<T, ApiError>;

    /// Add context for forbidden errors.
    fn forbidden(self, message: impl Into<String>) -> Result<T, ApiError>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ErrorContext<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::Internal(anyhow::Error::from(e).context(context.into())))
    }

    fn not_found(self, resource: impl Into<String>) -> Result<T, ApiError> {
        self.map_err(|_| ApiError::NotFound(resource.into()))
    }

    fn forbidden(self, message: impl Into<String>) -> Result<T, ApiError> {
        self.map_err(|_| ApiError::Forbidden(message.into()))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, context: impl Into<String>) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::Internal(anyhow::anyhow!(context.into())))
    }

    fn not_found(self, resource: impl Into<String>) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::NotFound(resource.into()))
    }

    fn forbidden(self, message: impl Into<String>) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::Forbidden(message.into()))
    }
}

/// Create a conflict error.
pub fn conflict(message: impl Into<String>) -> ApiError {
    ApiError::Conflict(message.into())
}

/// Create an invalid state transition error.
pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> ApiError {
    ApiError::InvalidTransition(format!("Cannot move from {} to {}", from, to))
}

/// Create an invalid reference error.
pub fn invalid_reference(field: &str, message: impl std::fmt::Display) -> ApiError {
    ApiError::InvalidReference(format!("{}: {}", field, message))
}
