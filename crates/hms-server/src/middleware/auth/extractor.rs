//! Authentication extractors for handlers.

use super::types::AuthUser;
use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Extractor for the authenticated account (required).
pub struct Auth(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(Auth)
            .ok_or(ApiError::NoToken)
    }
}

/// Extractor for an optional authenticated account.
pub struct MaybeAuth(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<AuthUser>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use hms_common_core::{Role, UserId};

    fn user() -> AuthUser {
        AuthUser {
            id: UserId::new(),
            name: "Test".into(),
            email: "test@example.com".into(),
            role: Role::Patient,
        }
    }

    #[tokio::test]
    async fn test_auth_extractor_success() {
        let auth_user = user();
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(auth_user.clone());

        let Auth(extracted) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted.id, auth_user.id);
    }

    #[tokio::test]
    async fn test_auth_extractor_missing() {
        let (mut parts, _) = Request::new(()).into_parts();

        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::NoToken)));
    }

    #[tokio::test]
    async fn test_maybe_auth_extractor() {
        let (mut parts, _) = Request::new(()).into_parts();
        let MaybeAuth(none) = MaybeAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(none.is_none());

        parts.extensions.insert(user());
        let MaybeAuth(some) = MaybeAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(some.is_some());
    }
}
