//! Fixed-window rate limiting through the full router.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{build_request, TestApp, TestResponse, SECRET};
use hms_common_core::Role;
use hms_server::{config::BypassRuleConfig, ServerConfig};
use serde_json::json;
use std::time::Duration;

fn limited_app() -> TestApp {
    TestApp::with_config(ServerConfig::with_secret(SECRET))
}

async fn get_from(app: &TestApp, uri: &str, token: &str, ip: &str) -> TestResponse {
    app.send(build_request(
        Method::GET,
        uri,
        Some(token),
        None,
        &[("x-forwarded-for", ip)],
    ))
    .await
}

#[tokio::test]
async fn test_sixth_request_in_window_is_rejected() {
    let app = limited_app();
    let patient = app.seed(Role::Patient).await;

    for remaining in (0..5).rev() {
        let res = get_from(&app, "/api/v1/appointments", &patient.token, "10.0.0.1").await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.headers["x-ratelimit-limit"], "5");
        assert_eq!(res.headers["x-ratelimit-remaining"], remaining.to_string().as_str());
    }

    let res = get_from(&app, "/api/v1/appointments", &patient.token, "10.0.0.1").await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.code(), "RATE_LIMITED");
    assert!(res.headers.contains_key(header::RETRY_AFTER));
    assert!(res.body["retryAfter"].as_u64().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_window_reset_restores_access() {
    let mut config = ServerConfig::with_secret(SECRET);
    config.rate_limit.window_ms = 60_000;
    let app = TestApp::with_config(config);
    let patient = app.seed(Role::Patient).await;

    for _ in 0..5 {
        let res = get_from(&app, "/api/v1/appointments", &patient.token, "10.0.0.9").await;
        assert_eq!(res.status, StatusCode::OK);
    }
    let res = get_from(&app, "/api/v1/appointments", &patient.token, "10.0.0.9").await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.body["retryAfter"], 60);

    tokio::time::advance(Duration::from_secs(30)).await;
    let res = get_from(&app, "/api/v1/appointments", &patient.token, "10.0.0.9").await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.body["retryAfter"], 30);

    tokio::time::advance(Duration::from_secs(30)).await;
    let res = get_from(&app, "/api/v1/appointments", &patient.token, "10.0.0.9").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers["x-ratelimit-remaining"], "4");
}

#[tokio::test]
async fn test_keys_combine_address_and_account() {
    let app = limited_app();
    let first = app.seed(Role::Patient).await;
    let second = app.seed(Role::Patient).await;

    for _ in 0..5 {
        let res = get_from(&app, "/api/v1/encounters", &first.token, "10.0.0.2").await;
        assert_eq!(res.status, StatusCode::OK);
    }
    let res = get_from(&app, "/api/v1/encounters", &first.token, "10.0.0.2").await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);

    // Same address, other account.
    let res = get_from(&app, "/api/v1/encounters", &second.token, "10.0.0.2").await;
    assert_eq!(res.status, StatusCode::OK);

    // Same account, other address.
    let res = get_from(&app, "/api/v1/encounters", &first.token, "10.0.0.3").await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_bypasses_everywhere() {
    let app = limited_app();
    let admin = app.seed(Role::Admin).await;

    for _ in 0..12 {
        let res = get_from(&app, "/api/v1/users", &admin.token, "10.0.0.4").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(!res.headers.contains_key("x-ratelimit-limit"));
    }
}

#[tokio::test]
async fn test_chat_bypassed_for_any_account() {
    let app = limited_app();
    let patient = app.seed(Role::Patient).await;

    for _ in 0..12 {
        let res = get_from(&app, "/api/v1/chat/conversations", &patient.token, "10.0.0.5").await;
        assert_eq!(res.status, StatusCode::OK);
    }

    // Chat traffic does not use up the window for other routes.
    let res = get_from(&app, "/api/v1/appointments", &patient.token, "10.0.0.5").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers["x-ratelimit-remaining"], "4");
}

#[tokio::test]
async fn test_custom_bypass_rules() {
    let mut config = ServerConfig::with_secret(SECRET);
    config.rate_limit.max_requests = 1;
    config.rate_limit.bypass = vec![BypassRuleConfig {
        role: Some(Role::Doctor),
        path_prefix: "/api/v1/encounters".into(),
    }];
    let app = TestApp::with_config(config);
    let doctor = app.seed(Role::Doctor).await;
    let admin = app.seed(Role::Admin).await;

    for _ in 0..3 {
        let res = get_from(&app, "/api/v1/encounters", &doctor.token, "10.0.0.6").await;
        assert_eq!(res.status, StatusCode::OK);
    }

    let res = get_from(&app, "/api/v1/users", &admin.token, "10.0.0.6").await;
    assert_eq!(res.status, StatusCode::OK);
    let res = get_from(&app, "/api/v1/users", &admin.token, "10.0.0.6").await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_login_limited_by_address() {
    let app = limited_app();
    let attempt = |ip: &'static str| {
        build_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "whatever"})),
            &[("x-forwarded-for", ip)],
        )
    };

    for _ in 0..5 {
        let res = app.send(attempt("10.0.0.7")).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }
    let res = app.send(attempt("10.0.0.7")).await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);

    let res = app.send(attempt("10.0.0.8")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unauthenticated_request_rejected_before_counting() {
    let app = limited_app();
    let patient = app.seed(Role::Patient).await;

    for _ in 0..10 {
        let req = build_request(
            Method::GET,
            "/api/v1/appointments",
            None,
            None,
            &[("x-forwarded-for", "10.0.0.9")],
        );
        let res = app.send(req).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }

    let res = get_from(&app, "/api/v1/appointments", &patient.token, "10.0.0.9").await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_disabled_limiter() {
    let app = TestApp::new();
    let patient = app.seed(Role::Patient).await;
    for _ in 0..10 {
        let res = get_from(&app, "/api/v1/appointments", &patient.token, "10.0.0.10").await;
        assert_eq!(res.status, StatusCode::OK);
    }
}
