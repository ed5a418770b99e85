//! Configuration loading utilities.

use super::types::ServerConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Plain environment variables honored on top of the prefixed ones.
const ALIASES: [(&str, &str); 4] = [
    ("PORT", "server.port"),
    ("JWT_SECRET", "auth.jwt_secret"),
    ("FRONTEND_URL", "cors.frontend_url"),
    ("LOG_LEVEL", "logging.level"),
];

/// Load configuration from various sources.
///
/// Later sources win: embedded defaults, then the optional config file,
/// then `HMS__SECTION__KEY` variables, then the plain aliases.
pub struct ConfigLoader {
    config_path: Option<String>,
    env_prefix: String,
    use_aliases: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: "HMS".to_string(),
            use_aliases: true,
        }
    }

    /// Set config file path.
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Set environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Ignore `PORT`, `JWT_SECRET` and friends.
    pub fn without_aliases(mut self) -> Self {
        self.use_aliases = false;
        self
    }

    /// Load configuration.
    pub fn load(&self) -> Result<ServerConfig> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::File::from_str(
            include_str!("defaults.toml"),
            config::FileFormat::Toml,
        ));

        if let Some(path) = &self.config_path {
            if Path::new(path).exists() {
                info!(path = %path, "Loading config file");
                builder = builder.add_source(config::File::with_name(path));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        if self.use_aliases {
            for (var, key) in ALIASES {
                builder = builder
                    .set_override_option(key, std::env::var(var).ok())
                    .with_context(|| format!("Failed to apply {}", var))?;
            }
        }

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from environment.
pub fn load_config() -> Result<ServerConfig> {
    let config_path = std::env::var("HMS_CONFIG")
        .or_else(|_| std::env::var("CONFIG_PATH"))
        .ok();

    let mut loader = ConfigLoader::new();
    if let Some(path) = config_path {
        loader = loader.with_config_path(path);
    }

    loader.load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config = ConfigLoader::new()
            .with_env_prefix("HMS_LOADER_TEST_UNUSED")
            .without_aliases()
            .load()
            .unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_ms, 1000);
        assert_eq!(config.rate_limit.bypass.len(), 2);
        assert_eq!(config.rate_limit.bypass[1].role, None);
        assert_eq!(config.auth.cookie_name, "token");
        assert!(!config.bootstrap.is_configured());
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let config = ConfigLoader::new()
            .with_env_prefix("HMS_LOADER_TEST_UNUSED")
            .with_config_path("/nonexistent/hms.toml")
            .without_aliases()
            .load();
        assert!(config.is_ok());
    }
}
