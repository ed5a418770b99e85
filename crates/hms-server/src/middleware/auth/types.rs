//! Authentication types.

use crate::models::User;
use chrono::Utc;
use hms_common_core::{Role, UserId};
use serde::{Deserialize, Serialize};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id, bare UUID).
    pub sub: String,
    /// Role at issue time. Authorization uses the stored role instead.
    pub role: Role,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: UserId, role: Role, expires_in: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.as_uuid().to_string(),
            role,
            iat: now,
            exp: now + expires_in,
        }
    }

    /// Subject as a user id.
    pub fn user_id(&self) -> Option<UserId> {
        UserId::parse(&self.sub).ok()
    }
}

/// Authenticated account attached to the request by [`super::AuthLayer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_subject() {
        let id = UserId::new();
        let claims = Claims::new(id, Role::Admin, 60);
        assert_eq!(claims.user_id(), Some(id));
        assert!(claims.exp > claims.iat);

        let bad = Claims {
            sub: "nope".into(),
            ..claims
        };
        assert_eq!(bad.user_id(), None);
    }

    #[test]
    fn test_from_user() {
        let user = User::new("Ann", "ann@example.com", String::new(), Role::Receptionist);
        let auth = AuthUser::from(&user);
        assert_eq!(auth.id, user.id);
        assert!(!auth.is_admin());
        assert!(auth.has_role(&[Role::Admin, Role::Receptionist]));
    }
}
