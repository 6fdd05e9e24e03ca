//! Sync pipeline
//!
//! Fetch, flatten, convert, replace. Each stage only starts once the previous
//! one finished successfully, so a failed fetch never touches the table.

use crate::error::Result;
use crate::fetch::{CampaignFetcher, CampaignFilter};
use crate::flatten::flatten;
use crate::output::{rows_to_batch, TableRef, WarehouseSink};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Default maximum number of campaigns per run
pub const DEFAULT_LIMIT: usize = 1000;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Campaigns fetched
    pub campaigns: usize,
    /// Rows written
    pub rows: usize,
    /// Table that was replaced, as `project.dataset.table`
    pub table: String,
    /// When the write completed
    pub finished_at: DateTime<Utc>,
}

/// One end-to-end sync of campaign tags into a warehouse table
pub struct SyncPipeline {
    fetcher: CampaignFetcher,
    sink: Arc<dyn WarehouseSink>,
    table: TableRef,
    filter: CampaignFilter,
    limit: usize,
}

impl SyncPipeline {
    /// Create a pipeline with the email filter and default limit
    pub fn new(fetcher: CampaignFetcher, sink: Arc<dyn WarehouseSink>, table: TableRef) -> Self {
        Self {
            fetcher,
            sink,
            table,
            filter: CampaignFilter::default(),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Set the campaign filter
    #[must_use]
    pub fn with_filter(mut self, filter: CampaignFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the maximum number of campaigns fetched
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Get the target table
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Run the pipeline once
    pub async fn run(&self) -> Result<SyncSummary> {
        let start = Instant::now();

        let campaigns = self.fetcher.fetch(&self.filter, self.limit).await?;
        let campaign_count = campaigns.len();
        info!("Fetched {} campaigns", campaign_count);

        let rows = flatten(campaigns);
        if rows.is_empty() {
            warn!("No campaign tags found, {} will be emptied", self.table);
        } else {
            info!("Flattened into {} campaign-tag rows", rows.len());
        }

        let batch = rows_to_batch(&rows)?;
        let written = self.sink.replace(&self.table, &batch).await?;

        info!(
            "Sync of {} to {} complete in {:?}",
            self.table,
            self.sink.describe(),
            start.elapsed()
        );

        Ok(SyncSummary {
            campaigns: campaign_count,
            rows: written,
            table: self.table.to_string(),
            finished_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for SyncPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncPipeline")
            .field("fetcher", &self.fetcher)
            .field("sink", &self.sink.describe())
            .field("table", &self.table)
            .field("filter", &self.filter)
            .field("limit", &self.limit)
            .finish()
    }
}
