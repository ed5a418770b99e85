//! API error types.

use axum::http::StatusCode;
use std::collections::HashMap;
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error enum covering all error cases.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    ValidationError(HashMap<String, Vec<String>>),

    #[error("Invalid {0} id")]
    InvalidId(&'static str),

    #[error("{0}")]
    InvalidReference(String),

    #[error("Payment exceeds outstanding balance of {outstanding_cents} cents")]
    Overpayment { outstanding_cents: i64 },

    #[error("You cannot delete your own account")]
    CannotDeleteSelf,

    // 401 Unauthorized
    #[error("Not authorized, no token provided")]
    NoToken,

    #[error("Not authorized, token invalid")]
    InvalidToken,

    #[error("Not authorized, token expired")]
    TokenExpired,

    #[error("Not authorized, user not found")]
    UserNotFound,

    #[error("Invalid email or password")]
    InvalidCredentials,

    // 401 for token holders, 403 on login
    #[error("Account has been deactivated")]
    AccountDisabled { on_login: bool },

    // 403 Forbidden
    #[error("{0}")]
    Forbidden(String),

    // 404 Not Found
    #[error("{0} not found")]
    NotFound(String),

    // 409 Conflict
    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("{0}")]
    SlotUnavailable(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Encounter is closed and can no longer be modified")]
    EncounterClosed,

    #[error("Invoice has been voided")]
    InvoiceVoid,

    #[error("{0}")]
    Conflict(String),

    // 429 Too Many Requests
    #[error("Too many requests, please slow down")]
    RateLimited { retry_after: u64 },

    // 500 Internal Server Error
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    /// Forbidden error naming the role that was refused.
    pub fn role_not_allowed(role: impl std::fmt::Display) -> Self {
        Self::Forbidden(format!("Role '{}' is not allowed to access this resource", role))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::ValidationError(_)
            | Self::InvalidId(_)
            | Self::InvalidReference(_)
            | Self::Overpayment { .. }
            | Self::CannotDeleteSelf => StatusCode::BAD_REQUEST,

            Self::NoToken
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::UserNotFound
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            Self::AccountDisabled { on_login: false } => StatusCode::UNAUTHORIZED,
            Self::AccountDisabled { on_login: true } => StatusCode::FORBIDDEN,

            Self::Forbidden(_) => StatusCode::FORBIDDEN,

            Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::EmailTaken
            | Self::SlotUnavailable(_)
            | Self::InvalidTransition(_)
            | Self::EncounterClosed
            | Self::InvoiceVoid
            | Self::Conflict(_) => StatusCode::CONFLICT,

            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for client handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidId(_) => "INVALID_ID",
            Self::InvalidReference(_) => "INVALID_REFERENCE",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::CannotDeleteSelf => "CANNOT_DELETE_SELF",
            Self::NoToken => "NO_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountDisabled { .. } => "ACCOUNT_DISABLED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::SlotUnavailable(_) => "SLOT_UNAVAILABLE",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::EncounterClosed => "ENCOUNTER_CLOSED",
            Self::InvoiceVoid => "INVOICE_VOID",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Whether this error came out of authentication or authorization.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::NoToken
                | Self::InvalidToken
                | Self::TokenExpired
                | Self::UserNotFound
                | Self::InvalidCredentials
                | Self::AccountDisabled { .. }
                | Self::Forbidden(_)
        )
    }
}
