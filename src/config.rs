//! Configuration types for a sync run
//!
//! A run is configured from an optional YAML file; every field has a
//! default, so an empty file (or none) is a valid starting point. CLI flags
//! are layered on top by the runner, and a few environment variables fill
//! what is still unset. Those variables may also come from a `.env` file,
//! see [`load_dotenv`].
//!
//! ```yaml
//! api:
//!   revision: "2024-07-15"
//!   max_rate_limit_retries: 20
//! fetch:
//!   channel: email
//!   limit: 1000
//! destination:
//!   kind: object_store
//!   url: gs://acme-warehouse/raw
//!   table:
//!     project: acme-analytics
//!     dataset: marketing
//! ```

use crate::auth::ApiKey;
use crate::error::{Error, Result};
use crate::fetch::{CampaignFilter, Channel};
use crate::http::{HttpClientConfig, RateLimitPolicy, RateLimiterConfig};
use crate::output::{TableRef, DEFAULT_TABLE};
use crate::pipeline::DEFAULT_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable read for the project when none is configured
pub const PROJECT_ID_ENV: &str = "PROJECT_ID";

/// Environment variable read for the dataset when none is configured
pub const DATASET_ID_ENV: &str = "DATASET_ID";

/// Older deployments kept the key here
pub const LEGACY_API_KEY_ENV: &str = "KKEY";

/// Load a `.env` file from the working directory or one of its parents
///
/// Variables already present in the environment are kept. Returns the file
/// that was loaded; a missing file is not an error.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenv::dotenv().ok()
}

/// Load a specific `.env` file into the process environment
pub fn load_dotenv_from(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    dotenv::from_path(path)
        .map_err(|e| Error::config(format!("Failed to load {}: {e}", path.display())))
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration of a sync run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// What to fetch
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Where to write
    #[serde(default)]
    pub destination: DestinationConfig,
}

impl SyncConfig {
    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse config from YAML text; blank text gives the defaults
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Fill unset project and dataset from `PROJECT_ID` / `DATASET_ID`
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Same as [`apply_env`](Self::apply_env) with a custom variable lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let table = &mut self.destination.table;
        if table.project.is_empty() {
            if let Some(project) = lookup(PROJECT_ID_ENV) {
                table.project = project;
            }
        }
        if table.dataset.is_empty() {
            if let Some(dataset) = lookup(DATASET_ID_ENV) {
                table.dataset = dataset;
            }
        }
    }

    /// Check the config is complete enough to run a sync
    pub fn validate(&self) -> Result<()> {
        if self.fetch.limit == 0 {
            return Err(Error::invalid_value(
                "fetch.limit",
                "must be greater than zero",
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(Error::missing_field("api.base_url"));
        }

        let destination = &self.destination;
        match destination.kind {
            DestinationKind::Duckdb if destination.path.is_none() => {
                return Err(Error::missing_field("destination.path"));
            }
            DestinationKind::ObjectStore if destination.url.is_none() => {
                return Err(Error::missing_field("destination.url"));
            }
            _ => {}
        }

        let table = &destination.table;
        if table.project.is_empty() {
            return Err(Error::missing_field("destination.table.project"));
        }
        if table.dataset.is_empty() {
            return Err(Error::missing_field("destination.table.dataset"));
        }
        if table.table.is_empty() {
            return Err(Error::missing_field("destination.table.table"));
        }

        Ok(())
    }

    /// Resolve the API key: explicit value, then `api.api_key_env`, then `KKEY`
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<ApiKey> {
        self.resolve_api_key_with(explicit, |name| std::env::var(name).ok())
    }

    /// Same as [`resolve_api_key`](Self::resolve_api_key) with a custom variable lookup
    pub fn resolve_api_key_with(
        &self,
        explicit: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ApiKey> {
        explicit
            .map(str::to_string)
            .or_else(|| lookup(&self.api.api_key_env))
            .or_else(|| lookup(LEGACY_API_KEY_ENV))
            .map(ApiKey::new)
            .filter(|key| !key.is_blank())
            .ok_or_else(|| Error::missing_field(self.api.api_key_env.clone()))
    }

    /// HTTP client settings derived from the `api` section
    pub fn http_client_config(&self) -> HttpClientConfig {
        let api = &self.api;
        let default_retry_after = Duration::from_secs(api.default_retry_after_secs);
        let policy = match api.max_rate_limit_retries {
            Some(max) => RateLimitPolicy::bounded(default_retry_after, max),
            None => RateLimitPolicy::unbounded(default_retry_after),
        };

        let builder = HttpClientConfig::builder()
            .base_url(api.base_url.clone())
            .timeout(Duration::from_secs(api.timeout_secs))
            .header("revision", api.revision.clone())
            .rate_limit_policy(policy);

        if api.requests_per_second == 0 {
            builder.no_rate_limit().build()
        } else {
            builder
                .rate_limit(RateLimiterConfig::new(
                    api.requests_per_second,
                    api.burst_size.max(1),
                ))
                .build()
        }
    }

    /// The campaign filter: a raw expression wins over the channel
    pub fn campaign_filter(&self) -> CampaignFilter {
        match &self.fetch.filter {
            Some(expr) => CampaignFilter::Expression(expr.clone()),
            None => CampaignFilter::Channel(self.fetch.channel),
        }
    }

    /// The target table
    pub fn table_ref(&self) -> TableRef {
        let table = &self.destination.table;
        TableRef::new(&table.project, &table.dataset, &table.table)
    }
}

// ============================================================================
// API
// ============================================================================

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root, campaigns are listed at `{base_url}/campaigns/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `revision` header
    #[serde(default = "default_revision")]
    pub revision: String,

    /// Environment variable holding the private API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side pacing; 0 disables it
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Pacing burst size
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,

    /// Wait after a 429 without a usable `Retry-After`
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,

    /// Give up after this many consecutive 429s; unset retries forever
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            revision: default_revision(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
            default_retry_after_secs: default_retry_after_secs(),
            max_rate_limit_retries: None,
        }
    }
}

fn default_base_url() -> String {
    "https://a.klaviyo.com/api".to_string()
}

fn default_revision() -> String {
    "2024-07-15".to_string()
}

fn default_api_key_env() -> String {
    "KLAVIYO_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst_size() -> u32 {
    10
}

fn default_retry_after_secs() -> u64 {
    60
}

// ============================================================================
// Fetch
// ============================================================================

/// Which campaigns to fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Channel to list
    #[serde(default)]
    pub channel: Channel,

    /// Raw filter expression, replacing the channel filter
    #[serde(default)]
    pub filter: Option<String>,

    /// Maximum number of campaigns
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            channel: Channel::default(),
            filter: None,
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

// ============================================================================
// Destination
// ============================================================================

/// Kind of warehouse sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    /// DuckDB database file
    #[default]
    Duckdb,
    /// Parquet in object storage or a local directory
    ObjectStore,
}

/// Where rows are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Sink kind
    #[serde(default)]
    pub kind: DestinationKind,

    /// DuckDB database file (`:memory:` allowed)
    #[serde(default)]
    pub path: Option<String>,

    /// Object storage URL (`gs://`, `s3://`, `r2://`, `az://` or a local path)
    #[serde(default)]
    pub url: Option<String>,

    /// Target table
    #[serde(default)]
    pub table: TableConfig,
}

/// Target table name parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Project; falls back to `PROJECT_ID`
    #[serde(default)]
    pub project: String,

    /// Dataset; falls back to `DATASET_ID`
    #[serde(default)]
    pub dataset: String,

    /// Table name
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            dataset: String::new(),
            table: default_table(),
        }
    }
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn runnable() -> SyncConfig {
        let mut config = SyncConfig::default();
        config.destination.path = Some(":memory:".to_string());
        config.destination.table.project = "acme".to_string();
        config.destination.table.dataset = "marketing".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.api.base_url, "https://a.klaviyo.com/api");
        assert_eq!(config.api.revision, "2024-07-15");
        assert_eq!(config.api.api_key_env, "KLAVIYO_API_KEY");
        assert_eq!(config.api.default_retry_after_secs, 60);
        assert_eq!(config.api.max_rate_limit_retries, None);
        assert_eq!(config.fetch.channel, Channel::Email);
        assert_eq!(config.fetch.limit, 1000);
        assert_eq!(config.destination.kind, DestinationKind::Duckdb);
        assert_eq!(config.destination.table.table, "klaviyo_campaign_tags");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(SyncConfig::from_yaml("").unwrap(), SyncConfig::default());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
api:
  revision: "2025-01-15"
  max_rate_limit_retries: 5
  requests_per_second: 0
fetch:
  channel: sms
  limit: 50
destination:
  kind: object_store
  url: gs://acme-warehouse/raw
  table:
    project: acme-analytics
    dataset: marketing
"#;
        let config = SyncConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.api.revision, "2025-01-15");
        assert_eq!(config.api.max_rate_limit_retries, Some(5));
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.fetch.channel, Channel::Sms);
        assert_eq!(config.fetch.limit, 50);
        assert_eq!(config.destination.kind, DestinationKind::ObjectStore);
        assert_eq!(
            config.destination.url.as_deref(),
            Some("gs://acme-warehouse/raw")
        );
        assert_eq!(
            config.table_ref(),
            TableRef::new("acme-analytics", "marketing", "klaviyo_campaign_tags")
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_yaml_rejects_unknown_kind() {
        let result = SyncConfig::from_yaml("destination:\n  kind: bigtable\n");
        assert!(matches!(result, Err(Error::YamlParse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SyncConfig::load("/nonexistent/sync.yaml");
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.yaml");
        std::fs::write(&path, "fetch:\n  limit: 10\n").unwrap();

        let config = SyncConfig::load(&path).unwrap();
        assert_eq!(config.fetch.limit, 10);
    }

    #[test]
    fn test_apply_env_fills_only_unset_parts() {
        let mut config = SyncConfig::default();
        config.destination.table.dataset = "configured".to_string();
        config.apply_env_with(env(&[("PROJECT_ID", "env-project"), ("DATASET_ID", "env-ds")]));

        assert_eq!(config.destination.table.project, "env-project");
        assert_eq!(config.destination.table.dataset, "configured");
    }

    #[test]
    fn test_validate_accepts_runnable_config() {
        runnable().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let mut config = runnable();
        config.fetch.limit = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfigValue { field, .. }) if field == "fetch.limit"
        ));
    }

    #[test]
    fn test_validate_requires_destination_location() {
        let mut config = runnable();
        config.destination.path = None;
        assert!(matches!(
            config.validate(),
            Err(Error::MissingConfigField { field }) if field == "destination.path"
        ));

        config.destination.kind = DestinationKind::ObjectStore;
        assert!(matches!(
            config.validate(),
            Err(Error::MissingConfigField { field }) if field == "destination.url"
        ));
    }

    #[test]
    fn test_validate_requires_dataset() {
        let mut config = runnable();
        config.destination.table.dataset.clear();
        assert!(matches!(
            config.validate(),
            Err(Error::MissingConfigField { field }) if field == "destination.table.dataset"
        ));
    }

    #[test]
    fn test_resolve_api_key_order() {
        let config = SyncConfig::default();
        let lookup = env(&[("KLAVIYO_API_KEY", "pk_env"), ("KKEY", "pk_legacy")]);

        let key = config
            .resolve_api_key_with(Some("pk_flag"), &lookup)
            .unwrap();
        assert_eq!(key.expose(), "pk_flag");

        let key = config.resolve_api_key_with(None, &lookup).unwrap();
        assert_eq!(key.expose(), "pk_env");

        let key = config
            .resolve_api_key_with(None, env(&[("KKEY", "pk_legacy")]))
            .unwrap();
        assert_eq!(key.expose(), "pk_legacy");
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let config = SyncConfig::default();
        let err = config
            .resolve_api_key_with(None, env(&[("KLAVIYO_API_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfigField { field } if field == "KLAVIYO_API_KEY"
        ));
    }

    #[test]
    fn test_resolve_api_key_from_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# local credentials\nCAMPAIGN_TAG_SYNC_DOTENV_KEY=pk_from_dotenv\n",
        )
        .unwrap();

        let mut config = SyncConfig::default();
        config.api.api_key_env = "CAMPAIGN_TAG_SYNC_DOTENV_KEY".to_string();
        load_dotenv_from(&path).unwrap();

        let key = config.resolve_api_key(None).unwrap();
        assert_eq!(key.expose(), "pk_from_dotenv");
    }

    #[test]
    fn test_load_dotenv_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dotenv_from(dir.path().join(".env")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_http_client_config() {
        let mut config = SyncConfig::default();
        config.api.max_rate_limit_retries = Some(3);
        config.api.default_retry_after_secs = 5;

        let http = config.http_client_config();
        assert_eq!(http.base_url.as_deref(), Some("https://a.klaviyo.com/api"));
        assert_eq!(http.timeout, Duration::from_secs(30));
        assert_eq!(
            http.default_headers.get("revision"),
            Some(&"2024-07-15".to_string())
        );
        assert_eq!(
            http.rate_limit_policy,
            RateLimitPolicy::bounded(Duration::from_secs(5), 3)
        );
        assert_eq!(http.rate_limit, Some(RateLimiterConfig::new(10, 10)));

        config.api.requests_per_second = 0;
        assert!(config.http_client_config().rate_limit.is_none());
    }

    #[test]
    fn test_campaign_filter() {
        let mut config = SyncConfig::default();
        assert_eq!(
            config.campaign_filter(),
            CampaignFilter::Channel(Channel::Email)
        );

        config.fetch.filter = Some("equals(status,\"Sent\")".to_string());
        assert_eq!(
            config.campaign_filter(),
            CampaignFilter::Expression("equals(status,\"Sent\")".to_string())
        );
    }
}
