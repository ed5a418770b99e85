//! User accounts.

use crate::store::DocumentMeta;
use chrono::{DateTime, Utc};
use hms_common_core::{Role, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A stored account, including its credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Always stored lowercased.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub department: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub meta: DocumentMeta,
}

impl_document!(User, "users");

impl User {
    pub fn new(name: impl Into<String>, email: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: UserId::new(),
            name: name.into().trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role,
            phone: None,
            specialization: None,
            department: None,
            last_login_at: None,
            meta: DocumentMeta::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.meta.is_active
    }
}

/// Lowercase and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// An account as exposed to clients, without credential fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub department: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            phone: user.phone.clone(),
            specialization: user.specialization.clone(),
            department: user.department.clone(),
            last_login_at: user.last_login_at,
            is_active: user.meta.is_active,
            created_at: user.meta.created_at,
            updated_at: user.meta.updated_at,
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// Self-service patient registration.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Admin-created account of any role.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: Role,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 120))]
    pub specialization: Option<String>,
    #[validate(length(max = 120))]
    pub department: Option<String>,
}

/// Changes an account holder may make to their own profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    /// Required when `password` is set.
    pub current_password: Option<String>,
}

/// Administrative changes to an account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    #[validate(length(max = 120))]
    pub specialization: Option<String>,
    #[validate(length(max = 120))]
    pub department: Option<String>,
}

/// Token and account returned by register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_email() {
        let user = User::new(" Jane ", "  Jane@Example.COM ", String::new(), Role::Patient);
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.name, "Jane");
        assert!(user.is_active());
    }

    #[test]
    fn test_view_omits_password_hash() {
        let user = User::new("Jane", "jane@example.com", "secret-hash".into(), Role::Doctor);
        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "doctor");
        assert_eq!(json["isActive"], true);
    }

    #[test]
    fn test_stored_form_is_flat() {
        let user = User::new("Jane", "jane@example.com", "h".into(), Role::Admin);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["isActive"], true);
        assert!(json.get("meta").is_none());
        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, user.id);
    }
}
