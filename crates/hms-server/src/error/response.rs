//! Error response implementation.

use super::types::ApiError;
use crate::store::StoreError;
use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, warn};

/// Error response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(
                error = %self,
                code = self.error_code(),
                "Server error occurred"
            );
        } else if self.is_auth_error() {
            warn!(
                error = %self,
                code = self.error_code(),
                "Auth error occurred"
            );
        }

        let status = self.status_code();
        let code = self.error_code();

        let (message, errors, retry_after) = match &self {
            ApiError::ValidationError(field_errors) => {
                (self.to_string(), Some(field_errors.clone()), None)
            }
            ApiError::RateLimited { retry_after } => (self.to_string(), None, Some(*retry_after)),
            ApiError::Internal(err) => {
                // Don't expose internal error details in production
                let message = if cfg!(debug_assertions) {
                    format!("{}: {}", self, err)
                } else {
                    "An internal error occurred".to_string()
                };
                (message, None, None)
            }
            _ => (self.to_string(), None, None),
        };

        let body = ErrorResponse {
            success: false,
            code,
            message,
            errors,
            retry_after,
        };

        let mut response = (status, Json(body)).into_response();

        if let ApiError::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }

        response
    }
}

// Conversion implementations
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, .. } => ApiError::NotFound(collection.to_string()),
            StoreError::Duplicate { field, .. } if field == "email" => ApiError::EmailTaken,
            StoreError::Duplicate { field, value, .. } => {
                ApiError::Conflict(format!("Duplicate value for {}: {}", field, value))
            }
            StoreError::Serialization(_) => ApiError::Internal(anyhow::Error::from(err)),
            StoreError::Rejected(rejection) => match rejection.downcast::<ApiError>() {
                Ok(api_error) => *api_error,
                Err(other) => ApiError::Internal(anyhow::anyhow!(other)),
            },
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ApiError::TokenExpired,
            _ => ApiError::InvalidToken,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        ApiError::ValidationError(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = ApiError::NoToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NO_TOKEN");
        assert!(body["message"].as_str().unwrap().contains("no token"));
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_rejected_store_error_keeps_api_error() {
        let rejection = StoreError::Rejected(Box::new(ApiError::SlotUnavailable("taken".into())));
        assert!(matches!(ApiError::from(rejection), ApiError::SlotUnavailable(_)));

        let foreign = StoreError::Rejected("disk on fire".into());
        assert!(matches!(ApiError::from(foreign), ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after: 1 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");

        let body = body_json(response).await;
        assert_eq!(body["code"], "RATE_LIMITED");
        assert_eq!(body["retryAfter"], 1);
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), vec!["email".to_string()]);
        let response = ApiError::ValidationError(fields).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"]["email"][0], "email");
    }

    #[test]
    fn test_duplicate_email_maps_to_email_taken() {
        let err: ApiError = StoreError::Duplicate {
            collection: "users",
            field: "email".into(),
            value: "a@b.c".into(),
        }
        .into();
        assert!(matches!(err, ApiError::EmailTaken));
    }
}
