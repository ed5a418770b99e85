//! Rate limiting types.

use crate::config::RateLimitConfig;
use hms_common_core::Role;
use std::time::Duration;
use tokio::time::Instant;

/// Limits applied by [`super::RateLimitLayer`].
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Fixed window length.
    pub window: Duration,
    /// Key extraction strategy.
    pub key_strategy: KeyStrategy,
    /// Requests matching any rule are never limited.
    pub bypass: Vec<BypassRule>,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            key_strategy: KeyStrategy::Composite,
            bypass: Vec::new(),
        }
    }

    pub fn by_ip(mut self) -> Self {
        self.key_strategy = KeyStrategy::Ip;
        self
    }

    pub fn composite(mut self) -> Self {
        self.key_strategy = KeyStrategy::Composite;
        self
    }

    pub fn with_bypass(mut self, rules: Vec<BypassRule>) -> Self {
        self.bypass = rules;
        self
    }

    pub fn is_bypassed(&self, role: Option<Role>, path: &str) -> bool {
        self.bypass.iter().any(|rule| rule.matches(role, path))
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window()).with_bypass(
            config
                .bypass
                .iter()
                .map(|rule| BypassRule {
                    role: rule.role,
                    path_prefix: rule.path_prefix.clone(),
                })
                .collect(),
        )
    }
}

/// Strategy for extracting the rate limit key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Client IP only.
    Ip,
    /// Client IP plus account id when authenticated.
    Composite,
}

/// Role and path prefix exempt from limiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassRule {
    /// `None` matches any authenticated account.
    pub role: Option<Role>,
    pub path_prefix: String,
}

impl BypassRule {
    pub fn matches(&self, role: Option<Role>, path: &str) -> bool {
        let Some(role) = role else {
            return false;
        };
        self.role.map_or(true, |wanted| wanted == role) && under_prefix(path, &self.path_prefix)
    }
}

/// Whether `path` sits at or below `prefix`, compared by whole segments.
fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// Fixed-window counter for one key.
#[derive(Debug, Clone)]
pub struct WindowState {
    pub window_start: Instant,
    pub count: u32,
}

impl WindowState {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
        }
    }

    /// Start a fresh window if the current one has elapsed.
    pub fn roll(&mut self, now: Instant, window: Duration) {
        if now.duration_since(self.window_start) >= window {
            self.window_start = now;
            self.count = 0;
        }
    }

    pub fn resets_in(&self, now: Instant, window: Duration) -> Duration {
        (self.window_start + window).saturating_duration_since(now)
    }
}
