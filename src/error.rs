//! Error types for campaign-tag-sync
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for campaign-tag-sync
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Upstream API Errors
    // ============================================================================
    #[error("API rejected credentials (HTTP {status}): {body}")]
    Auth { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream error, HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Rate limited {attempts} times in a row, last retry-after {retry_after_seconds}s")]
    RateLimited {
        attempts: u32,
        retry_after_seconds: u64,
    },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Output Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("DuckDB error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(status: u16, body: impl Into<String>) -> Self {
        Self::Auth {
            status,
            body: body.into(),
        }
    }

    /// Create an upstream status error
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Classify a non-success, non-429 status into an auth or upstream error
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        if is_auth_status(status) {
            Self::auth(status, body)
        } else {
            Self::upstream(status, body)
        }
    }

    /// Check if this error came from exhausting the rate-limit retries
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// Check if the API rejected the credentials
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }
}

/// Statuses returned when the API key is missing, invalid or lacks scope
fn is_auth_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

/// Result type alias for campaign-tag-sync
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
