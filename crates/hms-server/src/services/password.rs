//! Password hashing.
//!
//! Argon2 work runs on the blocking pool so request workers stay free.

use crate::error::ApiError;
use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use once_cell::sync::Lazy;

/// Verified in place of a real hash when the account does not exist, so
/// unknown emails cost as much as wrong passwords.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_blocking("hms-placeholder-password").unwrap_or_default());

fn hash_blocking(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// An unparsable stored hash never verifies.
fn verify_blocking(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash a password into a PHC string.
pub async fn hash_password(password: &str) -> Result<String, ApiError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

/// Check a password against a stored PHC string.
///
/// With no stored hash the password is checked against a placeholder and
/// the result is always `false`.
pub async fn verify_password(password: &str, stored: Option<&str>) -> bool {
    let password = password.to_owned();
    let stored = stored.map(str::to_owned);
    tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verify_blocking(&password, &stored),
        None => {
            verify_blocking(&password, &DUMMY_HASH);
            false
        }
    })
    .await
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("correct horse").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", Some(hash.as_str())).await);
        assert!(!verify_password("wrong horse", Some(hash.as_str())).await);
    }

    #[tokio::test]
    async fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("anything", Some("")).await);
        assert!(!verify_password("anything", Some("not-a-phc-string")).await);
    }

    #[tokio::test]
    async fn test_missing_hash_runs_placeholder_and_fails() {
        assert!(DUMMY_HASH.starts_with("$argon2"));
        assert!(!verify_password("hms-placeholder-password", None).await);
    }
}
