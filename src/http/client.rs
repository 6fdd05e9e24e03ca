//! HTTP client with API-key auth and 429 handling
//!
//! Provides the client used against the marketing API:
//! - API key and revision headers on every request
//! - Client-side pacing through a token bucket
//! - Blocking retry of the same request on 429, honouring `Retry-After`
//! - Classification of every other non-2xx status as a fatal error

use super::rate_limit::{RateLimitPolicy, RateLimiter, RateLimiterConfig};
use crate::auth::ApiKeyAuth;
use crate::error::{Error, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Behaviour on 429 responses
    pub rate_limit_policy: RateLimitPolicy,
    /// Client-side pacing, `None` to send as fast as possible
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            rate_limit_policy: RateLimitPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: HashMap::new(),
            user_agent: format!("campaign-tag-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the 429 policy
    pub fn rate_limit_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.config.rate_limit_policy = policy;
        self
    }

    /// Set client-side pacing
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable client-side pacing
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP client for the marketing API
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    auth: Option<ApiKeyAuth>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            auth: None,
            rate_limiter,
        })
    }

    /// Create a client with API key authentication
    pub fn with_auth(config: HttpClientConfig, auth: ApiKeyAuth) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.auth = Some(auth);
        Ok(client)
    }

    /// Make a GET request with config
    pub async fn get_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::GET, url, config).await
    }

    /// Make a request, repeating it verbatim while the API answers 429
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let full_url = self.build_url(url);
        let timeout = config.timeout.unwrap_or(self.config.timeout);
        let policy = &self.config.rate_limit_policy;
        let mut rate_limited = 0u32;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self.client.request(method.clone(), &full_url);

            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }

            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }

            if !config.query.is_empty() {
                req = req.query(&config.query);
            }

            req = req.timeout(timeout);

            if let Some(ref auth) = self.auth {
                req = auth.apply(req);
            }

            // Transport failures are not retried
            let response = req.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                rate_limited += 1;
                let delay = policy.delay_for(response.headers());
                if !policy.allows_retry(rate_limited) {
                    return Err(Error::RateLimited {
                        attempts: rate_limited,
                        retry_after_seconds: delay.as_secs(),
                    });
                }
                warn!(
                    "Rate limited (429) on {} {}, attempt {}, retrying in {}s",
                    method,
                    full_url,
                    rate_limited,
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
                return Err(Error::from_status(status.as_u16(), body));
            }

            debug!("Request succeeded: {} {}", method, full_url);
            return Ok(response);
        }
    }

    /// Make a request and parse the JSON response body
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let response = self.request(method, url, config).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("invalid JSON body from {url}: {e}")))
    }

    /// Make a GET request with config and parse JSON response
    pub async fn get_json_with_config<T: DeserializeOwned>(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request_json(Method::GET, url, config).await
    }

    /// Check if client-side pacing is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_auth", &self.auth.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
