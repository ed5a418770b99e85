//! Registration, login and session handlers.

use super::update_where;
use crate::error::{ApiError, ApiResult, ErrorContext};
use crate::middleware::auth::{Auth, Claims};
use crate::models::{fields, normalize_email, AuthPayload, LoginRequest, RegisterRequest, User, UserView};
use crate::request::ValidatedJson;
use crate::response::{created, ok, with_message};
use crate::services::{hash_password, verify_password};
use crate::state::AppState;
use crate::store::{Filter, ID};
use axum::{extract::State, response::Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use hms_common_core::Role;
use tracing::info;

/// `POST /auth/register`: create a patient account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(CookieJar, Response)> {
    let mut user = User::new(req.name, &req.email, hash_password(&req.password).await?, Role::Patient);
    user.phone = req.phone;
    user.last_login_at = Some(Utc::now());

    let user = state.users.insert(user).await?;
    info!(user_id = %user.id, "Patient registered");

    let payload = issue_token(&state, &user)?;
    let jar = jar.add(auth_cookie(&state, payload.token.clone()));
    Ok((jar, created(payload, "Registration successful")))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<(CookieJar, Response)> {
    let email = normalize_email(&req.email);
    let account = state
        .users
        .find_one(&Filter::new().eq(fields::EMAIL, email.as_str()))
        .await?;
    let stored = account.as_ref().map(|user| user.password_hash.as_str());
    let verified = verify_password(&req.password, stored).await;
    let user = account
        .filter(|_| verified)
        .ok_or(ApiError::InvalidCredentials)?;

    let user = update_where(
        &*state.users,
        &Filter::new().eq(ID, user.id),
        None,
        |user: &mut User, _: &[User]| {
            if !user.is_active() {
                return Err(ApiError::AccountDisabled { on_login: true });
            }
            user.last_login_at = Some(Utc::now());
            Ok(())
        },
    )
    .await?
    .ok_or(ApiError::InvalidCredentials)?;
    info!(user_id = %user.id, role = %user.role, "User logged in");

    let payload = issue_token(&state, &user)?;
    let jar = jar.add(auth_cookie(&state, payload.token.clone()));
    Ok((jar, with_message(payload, "Login successful")))
}

/// `POST /auth/logout`: clear the auth cookie. Tokens are not revoked.
pub async fn logout(
    State(state): State<AppState>,
    Auth(user): Auth,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Response)> {
    let cookie = Cookie::build((state.config.auth.cookie_name.clone(), ""))
        .path("/")
        .http_only(true);
    let jar = jar.remove(cookie);
    info!(user_id = %user.id, "User logged out");
    Ok((jar, with_message(serde_json::Value::Null, "Logged out")))
}

/// `GET /auth/me`
pub async fn me(State(state): State<AppState>, Auth(user): Auth) -> ApiResult<Response> {
    let account = state
        .users
        .get(user.id.as_uuid())
        .await?
        .not_found("User")?;
    Ok(ok(UserView::from(account)))
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<AuthPayload> {
    let ttl = state.token_ttl();
    let claims = Claims::new(user.id, user.role, ttl);
    let token = state
        .decoder
        .encode(&claims)
        .context("failed to sign token")?;
    Ok(AuthPayload {
        token,
        expires_at: Utc::now() + Duration::seconds(ttl),
        user: UserView::from(user),
    })
}

fn auth_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let auth = &state.config.auth;
    Cookie::build((auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.cookie_secure)
        .build()
}
