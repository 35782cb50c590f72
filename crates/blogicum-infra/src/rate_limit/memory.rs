//! Per-client login throttling with governor's GCRA.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use blogicum_core::ports::{RateLimitError, RateLimiter, Throttle};

type KeyedLimiter = GovernorRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Stale client entries are swept after this many attempts.
const SWEEP_EVERY: u64 = 1024;

/// `max_requests` attempts per `window` and client, refilled evenly.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// `LOGIN_RATE_LIMIT_MAX` and `LOGIN_RATE_LIMIT_WINDOW_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: std::env::var("LOGIN_RATE_LIMIT_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: std::env::var("LOGIN_RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }

    fn quota(&self) -> Result<Quota, RateLimitError> {
        let burst = NonZeroU32::new(self.max_requests)
            .ok_or_else(|| RateLimitError::InvalidQuota("max_requests must be positive".into()))?;
        let period = Quota::with_period(self.window / self.max_requests)
            .ok_or_else(|| RateLimitError::InvalidQuota("window must be positive".into()))?;
        Ok(period.allow_burst(burst))
    }
}

/// Keyed in-process limiter. Each server instance counts on its own.
pub struct InMemoryRateLimiter {
    limiter: KeyedLimiter,
    clock: DefaultClock,
    attempts: AtomicU64,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        Ok(Self {
            limiter: KeyedLimiter::keyed(config.quota()?),
            clock: DefaultClock::default(),
            attempts: AtomicU64::new(0),
        })
    }

    fn sweep_if_due(&self) {
        if self.attempts.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.limiter.retain_recent();
            self.limiter.shrink_to_fit();
            tracing::debug!(clients = self.limiter.len(), "Swept login limiter state");
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn attempt(&self, key: &str) -> Result<Throttle, RateLimitError> {
        self.sweep_if_due();
        Ok(match self.limiter.check_key(&key.to_string()) {
            Ok(()) => Throttle::Allowed,
            Err(not_until) => Throttle::Limited {
                retry_after: not_until.wait_time_from(self.clock.now()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_burst_then_limited() {
        let limiter = limiter(2);

        assert_eq!(limiter.attempt("10.0.0.1").await.unwrap(), Throttle::Allowed);
        assert_eq!(limiter.attempt("10.0.0.1").await.unwrap(), Throttle::Allowed);
        match limiter.attempt("10.0.0.1").await.unwrap() {
            Throttle::Limited { retry_after } => assert!(retry_after > Duration::ZERO),
            Throttle::Allowed => panic!("third attempt should be limited"),
        }
    }

    #[tokio::test]
    async fn test_clients_are_counted_separately() {
        let limiter = limiter(1);

        assert!(limiter.attempt("10.0.0.1").await.unwrap().is_allowed());
        assert!(!limiter.attempt("10.0.0.1").await.unwrap().is_allowed());
        assert!(limiter.attempt("10.0.0.2").await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_sweep_keeps_limits() {
        let limiter = limiter(1);
        assert!(limiter.attempt("10.0.0.1").await.unwrap().is_allowed());

        for i in 0..SWEEP_EVERY {
            let _ = limiter.attempt(&format!("192.168.0.{}", i % 200)).await;
        }

        assert!(!limiter.attempt("10.0.0.1").await.unwrap().is_allowed());
    }

    #[test]
    fn test_zero_quota_rejected() {
        assert!(matches!(
            InMemoryRateLimiter::new(RateLimitConfig {
                max_requests: 0,
                window: Duration::from_secs(60),
            }),
            Err(RateLimitError::InvalidQuota(_))
        ));
    }
}
