//! Authorization middleware layer.

use super::audit::log_authz;
use crate::{error::ApiError, middleware::auth::types::AuthUser};
use axum::{
    body::Body,
    extract::OriginalUri,
    http::Request,
    response::{IntoResponse, Response},
};
use hms_common_core::Role;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Admits only accounts whose role is in a fixed list.
#[derive(Debug, Clone, Copy)]
pub struct AuthzLayer {
    allowed: &'static [Role],
}

impl AuthzLayer {
    pub fn allow(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Every role, for routes that only need authentication.
    pub fn any() -> Self {
        Self::allow(&Role::ALL)
    }

    /// Decide for an optional account.
    pub fn check(&self, user: Option<&AuthUser>) -> Result<(), ApiError> {
        match user {
            None => Err(ApiError::NoToken),
            Some(user) if user.has_role(self.allowed) => Ok(()),
            Some(user) => Err(ApiError::role_not_allowed(user.role)),
        }
    }
}

impl<S> Layer<S> for AuthzLayer {
    type Service = AuthzMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthzMiddleware {
            inner,
            layer: *self,
        }
    }
}

#[derive(Clone)]
pub struct AuthzMiddleware<S> {
    inner: S,
    layer: AuthzLayer,
}

impl<S> Service<Request<Body>> for AuthzMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let layer = self.layer;
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let user = req.extensions().get::<AuthUser>();
            let path = req
                .extensions()
                .get::<OriginalUri>()
                .map(|uri| uri.0.path().to_string())
                .unwrap_or_else(|| req.uri().path().to_string());
            let decision = layer.check(user);

            log_authz(
                user,
                req.method().as_str(),
                &path,
                layer.allowed,
                decision.is_ok(),
                decision.as_ref().err().map(|e| e.error_code()),
            );

            match decision {
                Ok(()) => inner.call(req).await,
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_common_core::UserId;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: UserId::new(),
            name: "T".into(),
            email: "t@example.com".into(),
            role,
        }
    }

    #[test]
    fn test_check() {
        let layer = AuthzLayer::allow(&[Role::Admin, Role::Doctor]);
        assert!(layer.check(Some(&user(Role::Doctor))).is_ok());

        let err = layer.check(Some(&user(Role::Patient))).unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
        assert!(err.to_string().contains("patient"));

        assert!(matches!(layer.check(None), Err(ApiError::NoToken)));
    }

    #[test]
    fn test_any_admits_every_role() {
        for role in Role::ALL {
            assert!(AuthzLayer::any().check(Some(&user(role))).is_ok());
        }
    }
}
