//! Rate limiting
//!
//! Two halves: a governor token bucket that paces outgoing requests, and the
//! policy applied when the API answers 429 anyway.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Retry-after used when a 429 carries no usable hint
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Configuration for client-side request pacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 10,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a permit, returning immediately
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}

/// What to do when the API answers 429
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Delay used when the response has no parseable `Retry-After`
    pub default_retry_after: Duration,
    /// Give up after this many consecutive 429s; `None` retries forever
    pub max_retries: Option<u32>,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            default_retry_after: DEFAULT_RETRY_AFTER,
            max_retries: None,
        }
    }
}

impl RateLimitPolicy {
    /// Unbounded retries with the given default delay
    pub fn unbounded(default_retry_after: Duration) -> Self {
        Self {
            default_retry_after,
            max_retries: None,
        }
    }

    /// Bounded retries with the given default delay
    pub fn bounded(default_retry_after: Duration, max_retries: u32) -> Self {
        Self {
            default_retry_after,
            max_retries: Some(max_retries),
        }
    }

    /// Whether another retry is allowed after `attempts` consecutive 429s
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts <= max)
    }

    /// Delay to wait before repeating a rate-limited request
    pub fn delay_for(&self, headers: &HeaderMap) -> Duration {
        retry_after(headers).unwrap_or(self.default_retry_after)
    }
}

/// Parse the `Retry-After` header as whole seconds
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
