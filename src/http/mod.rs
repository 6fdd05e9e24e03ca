//! HTTP client module
//!
//! Provides the HTTP client used against the marketing API.
//!
//! # Features
//!
//! - **API key auth**: every request carries the credential header
//! - **Pacing**: token bucket rate limiter using governor
//! - **429 handling**: the same request is repeated after `Retry-After`
//!   (or a default delay), optionally up to a bounded number of attempts
//! - **Error classification**: 401/403 are auth errors, every other
//!   non-2xx is an upstream error carrying the response body

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{
    retry_after, RateLimitPolicy, RateLimiter, RateLimiterConfig, DEFAULT_RETRY_AFTER,
};
