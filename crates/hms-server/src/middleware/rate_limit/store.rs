//! Rate limit storage backends.

use super::types::{RateLimitPolicy, WindowState};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Entries kept before expired windows are swept.
const SWEEP_THRESHOLD: usize = 10_000;

/// Trait for rate limit storage.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count a request against `key` and report whether it is allowed.
    async fn check_and_consume(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitResult;

    /// Current counter for a key, if any.
    async fn get_state(&self, key: &str) -> Option<WindowState>;
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_in: Duration,
}

impl RateLimitResult {
    /// Whole seconds until the window resets, at least 1.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_in.as_secs();
        if self.reset_in.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}

/// In-memory fixed-window store.
pub struct InMemoryStore {
    states: DashMap<String, WindowState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
        }
    }

    /// Drop counters whose window has elapsed.
    pub fn sweep(&self, window: Duration) {
        let now = Instant::now();
        self.states
            .retain(|_, state| now.duration_since(state.window_start) < window);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryStore {
    async fn check_and_consume(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitResult {
        if self.states.len() > SWEEP_THRESHOLD {
            self.sweep(policy.window);
        }

        let now = Instant::now();
        let mut entry = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| WindowState::new(now));

        let state = entry.value_mut();
        state.roll(now, policy.window);

        let allowed = state.count < policy.max_requests;
        if allowed {
            state.count += 1;
        }

        RateLimitResult {
            allowed,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(state.count),
            reset_in: state.resets_in(now, policy.window),
        }
    }

    async fn get_state(&self, key: &str) -> Option<WindowState> {
        self.states.get(key).map(|entry| entry.value().clone())
    }
}
