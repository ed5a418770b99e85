//! Authorization audit logging.

use crate::middleware::auth::types::AuthUser;
use chrono::{DateTime, Utc};
use hms_common_core::{Role, UserId};
use serde::Serialize;
use tracing::{info, warn};

/// One authorization decision.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthzAuditEvent {
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<UserId>,
    pub role: Option<Role>,
    pub method: String,
    pub path: String,
    pub allowed_roles: Vec<Role>,
    pub granted: bool,
    pub reason: Option<String>,
}

impl AuthzAuditEvent {
    pub fn new(
        user: Option<&AuthUser>,
        method: &str,
        path: &str,
        allowed_roles: &[Role],
        granted: bool,
        reason: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user.map(|u| u.id),
            role: user.map(|u| u.role),
            method: method.to_string(),
            path: path.to_string(),
            allowed_roles: allowed_roles.to_vec(),
            granted,
            reason,
        }
    }

    fn allowed(&self) -> String {
        self.allowed_roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn log(&self) {
        let user_id = self.user_id.map(|id| id.to_string());
        let role = self.role.map(|r| r.as_str());
        if self.granted {
            info!(
                event = "authz_granted",
                user_id = ?user_id,
                role = ?role,
                method = %self.method,
                path = %self.path,
                "Authorization granted"
            );
        } else {
            warn!(
                event = "authz_denied",
                user_id = ?user_id,
                role = ?role,
                method = %self.method,
                path = %self.path,
                allowed = %self.allowed(),
                reason = ?self.reason,
                "Authorization denied"
            );
        }
    }
}

/// Log an authorization decision.
pub fn log_authz(
    user: Option<&AuthUser>,
    method: &str,
    path: &str,
    allowed_roles: &[Role],
    granted: bool,
    reason: Option<&str>,
) {
    AuthzAuditEvent::new(user, method, path, allowed_roles, granted, reason.map(String::from)).log();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_fields() {
        let user = AuthUser {
            id: UserId::new(),
            name: "N".into(),
            email: "n@example.com".into(),
            role: Role::Technician,
        };
        let event = AuthzAuditEvent::new(
            Some(&user),
            "GET",
            "/api/v1/billing",
            &[Role::Admin, Role::Receptionist],
            false,
            Some("role not allowed".into()),
        );
        assert_eq!(event.role, Some(Role::Technician));
        assert_eq!(event.allowed(), "admin,receptionist");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["granted"], false);
        assert_eq!(json["allowedRoles"][1], "receptionist");
    }
}
