//! Request extractors and shared query parameters.

use crate::error::{ApiError, ApiResult};
use crate::response::PaginationParams;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::str::FromStr;
use validator::Validate;

/// JSON body that has passed `validator` checks.
///
/// Malformed JSON is a `BAD_REQUEST`; failed validation is a
/// `VALIDATION_ERROR` with per-field messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string extractor whose failures use the API error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Parameters accepted by every list endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    #[serde(alias = "per_page")]
    pub limit: Option<u32>,
    /// Honored for admins only.
    #[serde(default)]
    pub include_inactive: bool,
}

impl ListParams {
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

/// Parse a path segment into a typed id, rejecting it as `INVALID_ID`.
pub fn parse_id<I: FromStr>(raw: &str, kind: &'static str) -> ApiResult<I> {
    raw.parse().map_err(|_| ApiError::InvalidId(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_common_core::UserId;

    #[test]
    fn test_parse_id() {
        let id = UserId::new();
        assert_eq!(parse_id::<UserId>(&id.to_string(), "user").unwrap(), id);
        let err = parse_id::<UserId>("not-an-id", "user").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ID");
    }

    #[test]
    fn test_list_params_defaults() {
        let params = ListParams::default().pagination();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_list_params_from_query() {
        let params: ListParams =
            serde_urlencoded_like("page=3&per_page=500&includeInactive=true");
        assert_eq!(params.pagination().page(), 3);
        assert_eq!(params.pagination().limit(), 100);
        assert!(params.include_inactive);
    }

    fn serde_urlencoded_like(query: &str) -> ListParams {
        let uri: axum::http::Uri = format!("/x?{}", query).parse().unwrap();
        Query::<ListParams>::try_from_uri(&uri).unwrap().0
    }
}
