//! Throttling of repeated attempts, keyed by client.

use std::time::Duration;

use async_trait::async_trait;

/// Outcome of one counted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    Allowed,
    /// Over the limit; the next attempt is accepted after `retry_after`.
    Limited { retry_after: Duration },
}

impl Throttle {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Throttle::Allowed)
    }
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one attempt from `key`.
    async fn attempt(&self, key: &str) -> Result<Throttle, RateLimitError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("invalid rate limit: {0}")]
    InvalidQuota(String),
}
