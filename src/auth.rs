//! API key authentication
//!
//! Klaviyo private keys travel in the `Authorization` header with a
//! `Klaviyo-API-Key ` prefix. The key itself is wrapped so it never ends up
//! in logs or `Debug` output.

use reqwest::RequestBuilder;
use std::fmt;

/// Default header carrying the API key
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

/// Default prefix placed before the key value
pub const DEFAULT_AUTH_PREFIX: &str = "Klaviyo-API-Key ";

/// Opaque API credential
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw key value
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Header-based API key authentication
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    /// Header name (e.g. "Authorization")
    pub header_name: String,
    /// Prefix added before the key (e.g. "Klaviyo-API-Key ")
    pub prefix: String,
    /// The key
    pub key: ApiKey,
}

impl ApiKeyAuth {
    /// Klaviyo-style private key auth
    pub fn new(key: impl Into<ApiKey>) -> Self {
        Self {
            header_name: DEFAULT_AUTH_HEADER.to_string(),
            prefix: DEFAULT_AUTH_PREFIX.to_string(),
            key: key.into(),
        }
    }

    /// Override the header name
    #[must_use]
    pub fn with_header(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }

    /// Override the value prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Full header value
    pub fn header_value(&self) -> String {
        format!("{}{}", self.prefix, self.key.expose())
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(self.header_name.as_str(), self.header_value())
    }
}
