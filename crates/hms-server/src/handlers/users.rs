//! Account management handlers.

use super::update_where;
use crate::error::{ApiError, ApiResult, ErrorContext};
use crate::middleware::auth::Auth;
use crate::models::{
    fields, AdminUpdateUserRequest, CreateUserRequest, UpdateProfileRequest, User, UserView,
};
use crate::request::{parse_id, ApiQuery, ListParams, ValidatedJson};
use crate::response::{created, ok, paginated, with_message};
use crate::services::{hash_password, verify_password};
use crate::state::AppState;
use crate::store::{Filter, FindOptions, SortOrder, ID};
use axum::{
    extract::{Path, State},
    response::Response,
};
use hms_common_core::{Role, UserId};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub role: Option<Role>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorQuery {
    pub specialization: Option<String>,
    pub search: Option<String>,
}

/// `GET /users` (admin)
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Response> {
    let base = if params.include_inactive {
        Filter::new()
    } else {
        Filter::active()
    };
    let filter = base
        .eq_opt(fields::ROLE, query.role)
        .search(&[fields::NAME, fields::EMAIL], query.search.as_deref());

    let pagination = params.pagination();
    let options = FindOptions::page(pagination.page(), pagination.limit());
    let (users, total) = state.users.find_page(&filter, options).await?;
    let views: Vec<UserView> = users.iter().map(UserView::from).collect();
    Ok(paginated(views, &pagination, total))
}

/// `POST /users` (admin): create an account of any role.
pub async fn create(
    State(state): State<AppState>,
    Auth(admin): Auth,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<Response> {
    let mut user = User::new(req.name, &req.email, hash_password(&req.password).await?, req.role);
    user.phone = req.phone;
    user.specialization = req.specialization;
    user.department = req.department;

    let user = state.users.insert(user).await?;
    info!(user_id = %user.id, role = %user.role, created_by = %admin.id, "User created");
    Ok(created(UserView::from(user), "User created"))
}

/// `GET /users/doctors`: active doctors, for booking.
pub async fn doctors(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(query): ApiQuery<DoctorQuery>,
) -> ApiResult<Response> {
    let filter = Filter::active()
        .eq(fields::ROLE, Role::Doctor)
        .search(&[fields::SPECIALIZATION], query.specialization.as_deref())
        .search(&[fields::NAME, fields::SPECIALIZATION], query.search.as_deref());

    let pagination = params.pagination();
    let options =
        FindOptions::page(pagination.page(), pagination.limit()).sorted(SortOrder::OldestFirst);
    let (users, total) = state.users.find_page(&filter, options).await?;
    let views: Vec<UserView> = users.iter().map(UserView::from).collect();
    Ok(paginated(views, &pagination, total))
}

/// `GET /users/:id`: admins see anyone, others only themselves or a doctor.
pub async fn get(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: UserId = parse_id(&id, "user")?;
    let target = state.users.get(id.as_uuid()).await?.not_found("User")?;

    if !user.is_admin() {
        if !target.is_active() {
            return Err(ApiError::NotFound("User".into()));
        }
        if target.id != user.id && target.role != Role::Doctor {
            return Err(ApiError::Forbidden(
                "You can only view your own profile or a doctor's".into(),
            ));
        }
    }
    Ok(ok(UserView::from(target)))
}

/// `PUT /users/me`
pub async fn update_me(
    State(state): State<AppState>,
    Auth(user): Auth,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Response> {
    let account = state.users.get(user.id.as_uuid()).await?.not_found("User")?;

    let new_hash = match req.password {
        Some(password) => {
            let current = req
                .current_password
                .ok_or_else(|| super::missing_field("currentPassword"))?;
            if !verify_password(&current, Some(account.password_hash.as_str())).await {
                return Err(ApiError::BadRequest("Current password is incorrect".into()));
            }
            Some(hash_password(&password).await?)
        }
        None => None,
    };
    let password_changed = new_hash.is_some();

    let account = update_where(
        &*state.users,
        &Filter::new().eq(ID, user.id),
        None,
        |account: &mut User, _: &[User]| {
            if let Some(name) = req.name {
                account.name = name.trim().to_string();
            }
            if let Some(phone) = req.phone {
                account.phone = Some(phone);
            }
            if let Some(hash) = new_hash {
                account.password_hash = hash;
            }
            Ok(())
        },
    )
    .await?
    .not_found("User")?;
    if password_changed {
        info!(user_id = %account.id, "Password changed");
    }
    Ok(with_message(UserView::from(account), "Profile updated"))
}

/// `PATCH /users/:id` (admin)
pub async fn admin_update(
    State(state): State<AppState>,
    Auth(admin): Auth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AdminUpdateUserRequest>,
) -> ApiResult<Response> {
    let id: UserId = parse_id(&id, "user")?;
    if id == admin.id && (req.is_active == Some(false) || req.role.is_some_and(|r| r != Role::Admin)) {
        return Err(ApiError::CannotDeleteSelf);
    }

    let account = update_where(
        &*state.users,
        &Filter::new().eq(ID, id),
        None,
        |account: &mut User, _: &[User]| {
            if let Some(role) = req.role {
                account.role = role;
            }
            if let Some(is_active) = req.is_active {
                account.meta.is_active = is_active;
            }
            if let Some(specialization) = req.specialization {
                account.specialization = Some(specialization);
            }
            if let Some(department) = req.department {
                account.department = Some(department);
            }
            Ok(())
        },
    )
    .await?
    .not_found("User")?;
    info!(user_id = %account.id, updated_by = %admin.id, "User updated by admin");
    Ok(with_message(UserView::from(account), "User updated"))
}

/// `DELETE /users/:id` (admin): soft delete.
pub async fn delete(
    State(state): State<AppState>,
    Auth(admin): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: UserId = parse_id(&id, "user")?;
    if id == admin.id {
        return Err(ApiError::CannotDeleteSelf);
    }
    if !state.users.soft_delete(id.as_uuid()).await? {
        return Err(ApiError::NotFound("User".into()));
    }
    info!(user_id = %id, deleted_by = %admin.id, "User deactivated");
    Ok(with_message(serde_json::Value::Null, "User deactivated"))
}
