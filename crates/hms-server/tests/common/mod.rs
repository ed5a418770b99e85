//! Common helpers for router-level tests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use hms_common_core::Role;
use hms_server::{
    middleware::auth::Claims,
    models::User,
    routes::create_router,
    services::hash_password,
    store::Repository,
    AppState, ServerConfig,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-that-is-at-least-32-characters";

static EMAIL_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Router plus the state behind it.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

/// A seeded account and a valid token for it.
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> String {
        self.user.id.as_uuid().to_string()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::with_secret(SECRET);
    config.rate_limit.enabled = false;
    config
}

impl TestApp {
    /// App with rate limiting disabled.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let state = AppState::in_memory(config);
        let router = create_router(state.clone());
        Self { state, router }
    }

    /// Insert an account directly. Its password hash is empty, so it cannot
    /// log in.
    pub async fn seed(&self, role: Role) -> TestUser {
        self.seed_user(role, String::new()).await
    }

    /// Insert an account that can log in with `password`.
    pub async fn seed_with_password(&self, role: Role, password: &str) -> TestUser {
        self.seed_user(role, hash_password(password).await.unwrap()).await
    }

    async fn seed_user(&self, role: Role, password_hash: String) -> TestUser {
        let n = EMAIL_SEQ.fetch_add(1, Ordering::SeqCst);
        let email = format!("{}{}@hms.test", role, n);
        let user = User::new(format!("{} {}", role, n), &email, password_hash, role);
        let user = self.state.users.insert(user).await.unwrap();
        let token = self.token_for(&user, 3600);
        TestUser { user, token }
    }

    pub fn token_for(&self, user: &User, expires_in: i64) -> String {
        self.state
            .decoder
            .encode(&Claims::new(user.id, user.role, expires_in))
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.send(build_request(method, uri, token, body, &[])).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.call(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.call(Method::DELETE, uri, Some(token), None).await
    }
}

pub fn build_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
