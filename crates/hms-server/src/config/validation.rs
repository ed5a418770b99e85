//! Configuration validation.

use super::types::ServerConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JWT secret: must be at least 32 characters")]
    InvalidJwtSecret,

    #[error("Invalid token lifetime: {0}s (must be between 60s and 1 year)")]
    InvalidTokenTtl(u64),

    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    #[error("Invalid rate limit configuration")]
    InvalidRateLimit,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}")]
    InvalidLogFormat(String),

    #[error("Invalid bootstrap admin: {0}")]
    InvalidBootstrap(&'static str),
}

const MIN_SECRET_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 8;
const MIN_TOKEN_TTL_SECS: u64 = 60;
const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Validate server configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.auth.jwt_secret.len() < MIN_SECRET_LEN {
        errors.push(ConfigError::InvalidJwtSecret);
    }

    let ttl = config.auth.token_ttl_secs;
    if !(MIN_TOKEN_TTL_SECS..=MAX_TOKEN_TTL_SECS).contains(&ttl) {
        errors.push(ConfigError::InvalidTokenTtl(ttl));
    }

    if config.server.port == 0 {
        errors.push(ConfigError::InvalidPort(0));
    }

    let limits = &config.rate_limit;
    if limits.enabled && (limits.max_requests == 0 || limits.window_ms == 0) {
        errors.push(ConfigError::InvalidRateLimit);
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ConfigError::InvalidLogLevel(config.logging.level.clone()));
    }

    let valid_formats = ["pretty", "compact", "json"];
    if !valid_formats.contains(&config.logging.format.to_lowercase().as_str()) {
        errors.push(ConfigError::InvalidLogFormat(config.logging.format.clone()));
    }

    let bootstrap = &config.bootstrap;
    match (&bootstrap.admin_email, &bootstrap.admin_password) {
        (Some(_), None) | (None, Some(_)) => {
            errors.push(ConfigError::InvalidBootstrap(
                "admin_email and admin_password must be set together",
            ));
        }
        (Some(email), Some(password)) => {
            if !email.contains('@') {
                errors.push(ConfigError::InvalidBootstrap("admin_email is not an email address"));
            }
            if password.len() < MIN_PASSWORD_LEN {
                errors.push(ConfigError::InvalidBootstrap(
                    "admin_password must be at least 8 characters",
                ));
            }
        }
        (None, None) => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig::with_secret("a".repeat(32))
    }

    #[test]
    fn test_invalid_jwt_secret() {
        let mut config = test_config();
        config.auth.jwt_secret = "short".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().iter().any(|e| matches!(e, ConfigError::InvalidJwtSecret)));
    }

    #[test]
    fn test_invalid_token_ttl() {
        let mut config = test_config();
        config.auth.token_ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ConfigError::InvalidTokenTtl(0))));
    }

    #[test]
    fn test_invalid_port() {
        let mut config = test_config();
        config.server.port = 0;

        let result = validate_config(&config);
        assert!(result.unwrap_err().iter().any(|e| matches!(e, ConfigError::InvalidPort(0))));
    }

    #[test]
    fn test_invalid_rate_limit() {
        let mut config = test_config();
        config.rate_limit.max_requests = 0;

        let result = validate_config(&config);
        assert!(result.unwrap_err().iter().any(|e| matches!(e, ConfigError::InvalidRateLimit)));

        config.rate_limit.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level_and_format() {
        let mut config = test_config();
        config.logging.level = "invalid".to_string();
        config.logging.format = "xml".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ConfigError::InvalidLogLevel(_))));
        assert!(errors.iter().any(|e| matches!(e, ConfigError::InvalidLogFormat(_))));
    }

    #[test]
    fn test_bootstrap_rules() {
        let mut config = test_config();
        config.bootstrap.admin_email = Some("admin@hms.local".into());
        assert!(validate_config(&config).is_err());

        config.bootstrap.admin_password = Some("short".into());
        assert!(validate_config(&config).is_err());

        config.bootstrap.admin_password = Some("long-enough".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&test_config()).is_ok());
    }
}
