// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # campaign-tag-sync
//!
//! Copies the tags attached to Klaviyo campaigns into an analytical table.
//!
//! Campaigns are listed through the cursor-paginated `/campaigns/` endpoint
//! with their tags side-loaded, flattened to one row per (campaign, tag)
//! pair, and written as a full replacement of the target table.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use campaign_tag_sync::{
//!     ApiKeyAuth, CampaignFetcher, DuckDbSink, HttpClient, SyncConfig, SyncPipeline,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> campaign_tag_sync::Result<()> {
//!     let mut config = SyncConfig::default();
//!     config.apply_env();
//!
//!     let key = config.resolve_api_key(None)?;
//!     let client = HttpClient::with_auth(config.http_client_config(), ApiKeyAuth::new(key))?;
//!     let sink = Arc::new(DuckDbSink::open("warehouse.duckdb")?);
//!
//!     let summary = SyncPipeline::new(CampaignFetcher::new(client), sink, config.table_ref())
//!         .run()
//!         .await?;
//!     println!("{} rows written to {}", summary.rows, summary.table);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────┐   ┌──────────────┐
//! │   http   │──▶│   fetch    │──▶│ flatten │──▶│    output    │
//! │ 429 loop │   │ pagination │   │  rows   │   │ Arrow, sinks │
//! │ API key  │   │ decode     │   │         │   │ DuckDB, GCS  │
//! └──────────┘   └────────────┘   └─────────┘   └──────────────┘
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// API key authentication
pub mod auth;

/// HTTP client with rate-limit handling
pub mod http;

/// JSON:API response documents
pub mod decode;

/// Cursor pagination
pub mod pagination;

/// Campaign listing
pub mod fetch;

/// (campaign, tag) rows
pub mod flatten;

/// Arrow, Parquet and warehouse sinks
pub mod output;

/// End-to-end sync
pub mod pipeline;

/// Run configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

pub use auth::{ApiKey, ApiKeyAuth};
pub use config::SyncConfig;
pub use fetch::{CampaignFetcher, CampaignFilter, CampaignRecord, Channel, TagRef};
pub use flatten::{flatten, CampaignTagRow};
pub use http::{HttpClient, HttpClientConfig};
pub use output::{DuckDbSink, ObjectStoreSink, TableRef, WarehouseSink};
pub use pipeline::{SyncPipeline, SyncSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
