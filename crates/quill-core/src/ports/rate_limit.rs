//! Request throttling port.

use async_trait::async_trait;
use std::time::Duration;

/// Throttle keyed by caller (client address).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request against `key` and report whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

/// Outcome of a single check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the next request would be admitted.
    pub reset_after: Duration,
}

impl RateLimitResult {
    /// Whole seconds for a `Retry-After` header, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        self.reset_after.as_secs_f64().ceil().max(1.0) as u64
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limiter misconfigured: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),
}
