//! CLI commands and argument parsing

use crate::config::{DestinationKind, SyncConfig};
use crate::fetch::Channel;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Sync Klaviyo campaign tags into a warehouse table
#[derive(Parser, Debug)]
#[command(name = "campaign-tag-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Klaviyo private API key (defaults to the variable named by api.api_key_env)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch campaign tags and replace the warehouse table
    Sync {
        #[command(flatten)]
        fetch: FetchArgs,

        #[command(flatten)]
        destination: DestinationArgs,
    },

    /// Fetch campaign tags and print them as JSON lines, without writing
    Fetch {
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Validate the API key by fetching a single campaign
    Check,
}

/// Which campaigns to fetch
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Maximum number of campaigns
    #[arg(long)]
    pub limit: Option<usize>,

    /// Campaign channel
    #[arg(long, value_enum)]
    pub channel: Option<Channel>,

    /// Raw filter expression, replacing the channel filter
    #[arg(long)]
    pub filter: Option<String>,
}

impl FetchArgs {
    /// Layer these flags over a config
    pub fn apply(&self, config: &mut SyncConfig) {
        if let Some(limit) = self.limit {
            config.fetch.limit = limit;
        }
        if let Some(channel) = self.channel {
            config.fetch.channel = channel;
            config.fetch.filter = None;
        }
        if let Some(filter) = &self.filter {
            config.fetch.filter = Some(filter.clone());
        }
    }
}

/// Where the table is written
#[derive(Args, Debug, Clone, Default)]
pub struct DestinationArgs {
    /// DuckDB database file (`:memory:` allowed)
    #[arg(long, conflicts_with = "output")]
    pub duckdb: Option<String>,

    /// Object storage URL for Parquet output
    /// Supports: /path, s3://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Warehouse project (defaults to PROJECT_ID)
    #[arg(long)]
    pub project: Option<String>,

    /// Warehouse dataset (defaults to DATASET_ID)
    #[arg(long)]
    pub dataset: Option<String>,

    /// Table name
    #[arg(long)]
    pub table: Option<String>,
}

impl DestinationArgs {
    /// Layer these flags over a config
    pub fn apply(&self, config: &mut SyncConfig) {
        let destination = &mut config.destination;
        if let Some(path) = &self.duckdb {
            destination.kind = DestinationKind::Duckdb;
            destination.path = Some(path.clone());
        }
        if let Some(url) = &self.output {
            destination.kind = DestinationKind::ObjectStore;
            destination.url = Some(url.clone());
        }
        if let Some(project) = &self.project {
            destination.table.project = project.clone();
        }
        if let Some(dataset) = &self.dataset {
            destination.table.dataset = dataset.clone();
        }
        if let Some(table) = &self.table {
            destination.table.table = table.clone();
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
