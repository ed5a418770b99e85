//! Server configuration types.

use hms_common_core::Role;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server binding configuration.
    pub server: ServerBindConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Account seeded at startup.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl ServerConfig {
    /// Built-in defaults with the given signing secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            server: ServerBindConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                body_limit_bytes: default_body_limit(),
            },
            auth: AuthConfig {
                jwt_secret: jwt_secret.into(),
                token_ttl_secs: default_token_ttl(),
                cookie_name: default_cookie_name(),
                cookie_secure: false,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                max_requests: default_max_requests(),
                window_ms: default_window_ms(),
                bypass: default_bypass(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
                file: None,
                log_headers: false,
                exclude_paths: Vec::new(),
            },
            cors: CorsConfig {
                frontend_url: default_frontend_url(),
                allowed_origins: Vec::new(),
                allow_credentials: true,
                max_age_secs: default_cors_max_age(),
            },
            bootstrap: BootstrapConfig::default(),
        }
    }
}

/// Server binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerBindConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum request body size.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_body_limit() -> usize {
    1024 * 1024
}

impl ServerBindConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub jwt_secret: String,
    /// Token lifetime (seconds).
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Name of the cookie carrying the token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Mark the auth cookie `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_token_ttl() -> u64 {
    86400 // 1 day
}

fn default_cookie_name() -> String {
    "token".to_string()
}

fn default_true() -> bool {
    true
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests allowed per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window size in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Role and path combinations that skip limiting.
    #[serde(default = "default_bypass")]
    pub bypass: Vec<BypassRuleConfig>,
}

/// A `{role, pathPrefix}` pair exempt from rate limiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassRuleConfig {
    /// Account role; absent means any authenticated account.
    #[serde(default)]
    pub role: Option<Role>,
    /// Prefix of the full request path.
    #[serde(alias = "pathPrefix")]
    pub path_prefix: String,
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_ms() -> u64 {
    1000
}

fn default_bypass() -> Vec<BypassRuleConfig> {
    vec![
        BypassRuleConfig {
            role: Some(Role::Admin),
            path_prefix: "/".to_string(),
        },
        BypassRuleConfig {
            role: None,
            path_prefix: "/api/v1/chat".to_string(),
        },
    ]
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty, compact or json).
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Also write logs to this file.
    #[serde(default)]
    pub file: Option<String>,
    /// Log request headers (redacted) at debug level.
    #[serde(default)]
    pub log_headers: bool,
    /// Paths to exclude from request logging.
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origin of the web frontend.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    /// Additional allowed origins.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Allow credentials.
    #[serde(default = "default_true")]
    pub allow_credentials: bool,
    /// Max age for preflight cache.
    #[serde(default = "default_cors_max_age")]
    pub max_age_secs: u64,
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_cors_max_age() -> u64 {
    86400
}

impl CorsConfig {
    /// Frontend origin followed by any extra origins, without duplicates.
    pub fn origins(&self) -> Vec<String> {
        let mut origins = vec![self.frontend_url.trim_end_matches('/').to_string()];
        for origin in &self.allowed_origins {
            let origin = origin.trim_end_matches('/').to_string();
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        origins
    }
}

/// Administrator account created at startup when missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl BootstrapConfig {
    pub fn is_configured(&self) -> bool {
        self.admin_email.is_some() && self.admin_password.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bypass_rules() {
        let rules = default_bypass();
        assert_eq!(rules[0].role, Some(Role::Admin));
        assert_eq!(rules[0].path_prefix, "/");
        assert_eq!(rules[1].role, None);
    }

    #[test]
    fn test_cors_origins_dedup() {
        let cors = CorsConfig {
            frontend_url: "http://localhost:5173/".into(),
            allowed_origins: vec!["http://localhost:5173".into(), "https://hms.example".into()],
            allow_credentials: true,
            max_age_secs: 60,
        };
        assert_eq!(
            cors.origins(),
            vec!["http://localhost:5173".to_string(), "https://hms.example".to_string()]
        );
    }

    #[test]
    fn test_socket_addr() {
        let bind = ServerBindConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            request_timeout_secs: 30,
            body_limit_bytes: 1024,
        };
        assert_eq!(bind.socket_addr().unwrap().port(), 8080);
    }
}
