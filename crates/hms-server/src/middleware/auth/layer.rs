//! Authentication middleware layer.

use super::{jwt::TokenDecoder, types::AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::models::User;
use crate::store::Repository;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

/// Verifies the bearer token (or auth cookie) and attaches the account.
#[derive(Clone)]
pub struct AuthLayer {
    decoder: TokenDecoder,
    users: Arc<dyn Repository<User>>,
    cookie_name: Arc<str>,
}

impl AuthLayer {
    pub fn new(decoder: TokenDecoder, users: Arc<dyn Repository<User>>, cookie_name: &str) -> Self {
        Self {
            decoder,
            users,
            cookie_name: Arc::from(cookie_name),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

/// Authentication middleware service.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    layer: AuthLayer,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let layer = self.layer.clone();
        // Take the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match authenticate(&layer, req.headers()).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    inner.call(req).await
                }
                Err(err) => {
                    debug!(code = err.error_code(), path = %req.uri().path(), "Authentication failed");
                    Ok(err.into_response())
                }
            }
        })
    }
}

async fn authenticate(layer: &AuthLayer, headers: &HeaderMap) -> ApiResult<AuthUser> {
    let token = extract_token(headers, &layer.cookie_name).ok_or(ApiError::NoToken)?;
    let claims = layer.decoder.decode(&token)?;
    let user_id = claims.user_id().ok_or(ApiError::InvalidToken)?;

    let user = layer
        .users
        .get(user_id.as_uuid())
        .await?
        .ok_or(ApiError::UserNotFound)?;
    if !user.is_active() {
        return Err(ApiError::AccountDisabled { on_login: false });
    }

    Ok(AuthUser::from(&user))
}

/// Bearer token from `Authorization`, else the auth cookie.
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_token_from_bearer_header() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer test_token")]);
        assert_eq!(extract_token(&map, "token").as_deref(), Some("test_token"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; token=test_token")]);
        assert_eq!(extract_token(&map, "token").as_deref(), Some("test_token"));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from_header"),
            (header::COOKIE, "token=from_cookie"),
        ]);
        assert_eq!(extract_token(&map, "token").as_deref(), Some("from_header"));
    }

    #[test]
    fn test_non_bearer_scheme_falls_back_to_cookie() {
        let map = headers(&[(header::AUTHORIZATION, "Basic abc")]);
        assert_eq!(extract_token(&map, "token"), None);
    }

    #[test]
    fn test_extract_token_missing() {
        assert_eq!(extract_token(&HeaderMap::new(), "token"), None);
    }
}
