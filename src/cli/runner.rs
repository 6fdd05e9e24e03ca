//! CLI runner - executes commands

use crate::auth::ApiKeyAuth;
use crate::cli::commands::{Cli, Commands, DestinationArgs, FetchArgs, OutputFormat};
use crate::config::{DestinationKind, SyncConfig};
use crate::error::{Error, Result, ResultExt};
use crate::fetch::CampaignFetcher;
use crate::flatten::flatten;
use crate::http::HttpClient;
use crate::output::{CloudDestination, DuckDbSink, ObjectStoreSink, WarehouseSink};
use crate::pipeline::SyncPipeline;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Sync { fetch, destination } => self.sync(fetch, destination).await,
            Commands::Fetch { fetch } => self.fetch(fetch).await,
            Commands::Check => self.check().await,
        }
    }

    /// Load the config file (if any), then layer flags and environment
    fn load_config(
        &self,
        fetch: Option<&FetchArgs>,
        destination: Option<&DestinationArgs>,
    ) -> Result<SyncConfig> {
        let mut config = match &self.cli.config {
            Some(path) => SyncConfig::load(path)?,
            None => SyncConfig::default(),
        };
        if let Some(args) = fetch {
            args.apply(&mut config);
        }
        if let Some(args) = destination {
            args.apply(&mut config);
        }
        config.apply_env();
        Ok(config)
    }

    fn build_fetcher(&self, config: &SyncConfig) -> Result<CampaignFetcher> {
        let key = config.resolve_api_key(self.cli.api_key.as_deref())?;
        let client = HttpClient::with_auth(config.http_client_config(), ApiKeyAuth::new(key))?;
        Ok(CampaignFetcher::new(client))
    }

    fn build_sink(config: &SyncConfig) -> Result<Arc<dyn WarehouseSink>> {
        let destination = &config.destination;
        match destination.kind {
            DestinationKind::Duckdb => {
                let path = destination
                    .path
                    .as_deref()
                    .ok_or_else(|| Error::missing_field("destination.path"))?;
                let sink = DuckDbSink::open(path)
                    .with_context(|| format!("Failed to open DuckDB database {path}"))?;
                Ok(Arc::new(sink))
            }
            DestinationKind::ObjectStore => {
                let url = destination
                    .url
                    .as_deref()
                    .ok_or_else(|| Error::missing_field("destination.url"))?;
                Ok(Arc::new(ObjectStoreSink::new(CloudDestination::parse(url)?)))
            }
        }
    }

    /// Fetch, flatten and replace the warehouse table
    async fn sync(&self, fetch: &FetchArgs, destination: &DestinationArgs) -> Result<()> {
        let config = self.load_config(Some(fetch), Some(destination))?;
        config.validate()?;

        let sink = Self::build_sink(&config)?;
        info!("Syncing campaign tags into {}", sink.describe());

        let pipeline = SyncPipeline::new(self.build_fetcher(&config)?, sink, config.table_ref())
            .with_filter(config.campaign_filter())
            .with_limit(config.fetch.limit);
        let summary = pipeline.run().await?;

        self.output(&summary);
        Ok(())
    }

    /// Fetch and print rows without writing anywhere
    async fn fetch(&self, fetch: &FetchArgs) -> Result<()> {
        let config = self.load_config(Some(fetch), None)?;
        if config.fetch.limit == 0 {
            return Err(Error::invalid_value(
                "fetch.limit",
                "must be greater than zero",
            ));
        }

        let records = self
            .build_fetcher(&config)?
            .fetch(&config.campaign_filter(), config.fetch.limit)
            .await?;
        for row in flatten(records) {
            self.output(&row);
        }
        Ok(())
    }

    /// Validate credentials with a single-campaign request
    async fn check(&self) -> Result<()> {
        let config = self.load_config(None, None)?;
        let fetcher = self.build_fetcher(&config)?;

        match fetcher.fetch(&config.campaign_filter(), 1).await {
            Ok(_) => {
                self.output(&json!({
                    "status": "SUCCEEDED",
                    "message": "Connection successful"
                }));
                Ok(())
            }
            Err(e) => {
                self.output(&json!({
                    "status": "FAILED",
                    "message": format!("Connection failed: {e}")
                }));
                Err(e)
            }
        }
    }

    /// Output a message
    fn output<T: Serialize>(&self, msg: &T) {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg),
            OutputFormat::Pretty => serde_json::to_string_pretty(msg),
        };
        println!("{}", line.unwrap_or_default());
    }
}
