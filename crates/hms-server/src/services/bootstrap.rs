//! Startup seeding.

use super::password::hash_password;
use crate::config::BootstrapConfig;
use crate::error::ApiResult;
use crate::models::{fields, normalize_email, User};
use crate::store::{Filter, Repository};
use hms_common_core::Role;
use tracing::info;

const DEFAULT_ADMIN_NAME: &str = "Administrator";

/// Create the configured admin account unless its email is already taken.
///
/// Returns the new account, or `None` when nothing was seeded.
pub async fn seed_admin(
    users: &dyn Repository<User>,
    config: &BootstrapConfig,
) -> ApiResult<Option<User>> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(None);
    };

    let email = normalize_email(email);
    let existing = users
        .find_one(&Filter::new().eq(fields::EMAIL, email.as_str()))
        .await?;
    if existing.is_some() {
        info!(email = %email, "Bootstrap admin already present");
        return Ok(None);
    }

    let name = config.admin_name.as_deref().unwrap_or(DEFAULT_ADMIN_NAME);
    let admin = User::new(name, &email, hash_password(password).await?, Role::Admin);
    let admin = users.insert(admin).await?;
    info!(user_id = %admin.id, email = %admin.email, "Seeded bootstrap admin");
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::password::verify_password;
    use crate::store::MemoryRepository;

    fn config() -> BootstrapConfig {
        BootstrapConfig {
            admin_name: None,
            admin_email: Some("Admin@HMS.local".into()),
            admin_password: Some("change-me-now".into()),
        }
    }

    #[tokio::test]
    async fn test_seeds_once() {
        let users = MemoryRepository::<User>::new().with_unique(fields::EMAIL);

        let admin = seed_admin(&users, &config()).await.unwrap().unwrap();
        assert_eq!(admin.email, "admin@hms.local");
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.name, DEFAULT_ADMIN_NAME);
        assert!(verify_password("change-me-now", Some(admin.password_hash.as_str())).await);

        assert!(seed_admin(&users, &config()).await.unwrap().is_none());
        assert_eq!(users.count(&Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_is_noop() {
        let users = MemoryRepository::<User>::new();
        let seeded = seed_admin(&users, &BootstrapConfig::default()).await.unwrap();
        assert!(seeded.is_none());
    }
}
