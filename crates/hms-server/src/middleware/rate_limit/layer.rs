//! Rate limit middleware layer.

use super::{
    store::{InMemoryStore, RateLimitResult, RateLimitStore},
    types::{KeyStrategy, RateLimitPolicy},
};
use crate::{error::ApiError, middleware::auth::types::AuthUser};
use axum::{
    body::Body,
    extract::{ConnectInfo, OriginalUri, Request},
    http::{HeaderMap, HeaderName, HeaderValue, Response},
    response::IntoResponse,
};
use futures::future::BoxFuture;
use std::{
    net::SocketAddr,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::warn;

const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Fixed-window request limiter.
///
/// Mount it inside the authentication layer so the account is known when
/// the key is built.
#[derive(Clone)]
pub struct RateLimitLayer {
    store: Arc<dyn RateLimitStore>,
    policy: Arc<RateLimitPolicy>,
}

impl RateLimitLayer {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            policy: Arc::new(policy),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.store = store;
        self
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            store: self.store.clone(),
            policy: self.policy.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    store: Arc<dyn RateLimitStore>,
    policy: Arc<RateLimitPolicy>,
}

impl<S> Service<Request> for RateLimitMiddleware<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let store = self.store.clone();
        let policy = self.policy.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let role = req.extensions().get::<AuthUser>().map(|u| u.role);
            if policy.is_bypassed(role, &full_path(&req)) {
                return inner.call(req).await;
            }

            let key = extract_key(&req, policy.key_strategy);
            let result = store.check_and_consume(&key, &policy).await;

            if !result.allowed {
                warn!(key = %key, path = %full_path(&req), "Rate limit exceeded");
                let mut response = ApiError::RateLimited {
                    retry_after: result.retry_after_secs(),
                }
                .into_response();
                add_rate_limit_headers(response.headers_mut(), &result);
                return Ok(response);
            }

            let mut response = inner.call(req).await?;
            add_rate_limit_headers(response.headers_mut(), &result);
            Ok(response)
        })
    }
}

/// Path as the client sent it; nested routers strip their prefix from
/// `req.uri()`.
fn full_path(req: &Request) -> String {
    req.extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string())
}

fn add_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert(
        HeaderName::from_static(X_RATELIMIT_LIMIT),
        HeaderValue::from(result.limit),
    );
    headers.insert(
        HeaderName::from_static(X_RATELIMIT_REMAINING),
        HeaderValue::from(result.remaining),
    );
}

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// the socket peer, else `unknown`.
pub fn client_ip(req: &Request) -> String {
    let headers = req.headers();
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn extract_key(req: &Request, strategy: KeyStrategy) -> String {
    let ip = client_ip(req);
    match strategy {
        KeyStrategy::Ip => ip,
        KeyStrategy::Composite => match req.extensions().get::<AuthUser>() {
            Some(user) => format!("{}:{}", ip, user.id.as_uuid()),
            None => ip,
        },
    }
}
