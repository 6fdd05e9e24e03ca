//! Campaign fetch module
//!
//! Walks the cursor-paginated campaign listing and reassembles each campaign
//! with its side-loaded tags.
//!
//! # Overview
//!
//! - `CampaignFetcher` - the paginated fetch loop
//! - `CampaignRecord` / `TagRef` - one campaign and its tag references
//! - `CampaignFilter` / `Channel` - which campaigns are listed

mod types;

pub use types::{CampaignFilter, CampaignRecord, Channel, TagRef, TAGS_RELATIONSHIP, TAG_TYPE};

use crate::decode::{Document, IncludedIndex};
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{LinkCursorPaginator, NextPage, PaginationState, Paginator};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Path of the campaign listing, relative to the API base URL
pub const CAMPAIGNS_PATH: &str = "campaigns/";

/// Fetches campaigns and their tags from the listing endpoint
pub struct CampaignFetcher {
    /// HTTP client carrying auth, revision header and 429 policy
    client: HttpClient,
    /// Pagination strategy
    paginator: LinkCursorPaginator,
}

impl CampaignFetcher {
    /// Create a fetcher for the campaign listing
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            paginator: LinkCursorPaginator::default(),
        }
    }

    /// Fetch up to `limit` campaigns matching `filter`, with their tags
    ///
    /// Stops as soon as `limit` records are collected, even mid-page, without
    /// requesting further pages. Rate-limited requests are repeated by the
    /// client and never advance the cursor. Any other failure aborts the
    /// whole fetch; no partial result is returned.
    pub async fn fetch(
        &self,
        filter: &CampaignFilter,
        limit: usize,
    ) -> Result<Vec<CampaignRecord>> {
        let start = Instant::now();
        let mut campaigns = Vec::new();
        let mut state = PaginationState::new();

        if limit == 0 {
            return Ok(campaigns);
        }

        let filter_value = filter.to_query_value();
        info!(
            "Fetching up to {} campaigns with filter {}",
            limit, filter_value
        );

        loop {
            let mut request = RequestConfig::new()
                .header("accept", "application/json")
                .query("filter", filter_value.as_str())
                .query("fields[tag]", "name")
                .query("include", TAGS_RELATIONSHIP);
            for (key, value) in self.paginator.request_params(&state) {
                request = request.query(key, value);
            }

            let body = self
                .client
                .get_with_config(CAMPAIGNS_PATH, request)
                .await?
                .text()
                .await?;
            let document = Document::from_json(&body)?;

            if document.primary().is_empty() {
                warn!(
                    "No campaigns found in page {}: {}",
                    state.pages_fetched + 1,
                    body
                );
            }

            let tags = IncludedIndex::build(document.included(), TAG_TYPE, "name");
            for resource in document.primary() {
                campaigns.push(CampaignRecord::from_resource(resource, &tags)?);
                if campaigns.len() >= limit {
                    info!(
                        "Reached limit of {} campaigns after {} pages in {:?}",
                        limit,
                        state.pages_fetched + 1,
                        start.elapsed()
                    );
                    return Ok(campaigns);
                }
            }

            debug!(
                "Page {} yielded {} campaigns ({} total)",
                state.pages_fetched + 1,
                document.primary().len(),
                campaigns.len()
            );

            if let NextPage::Done = self.paginator.process_response(&document, &mut state) {
                break;
            }
        }

        info!(
            "Fetched {} campaigns in {} pages in {:?}",
            campaigns.len(),
            state.pages_fetched,
            start.elapsed()
        );
        Ok(campaigns)
    }
}

impl std::fmt::Debug for CampaignFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignFetcher")
            .field("client", &self.client)
            .field("path", &CAMPAIGNS_PATH)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
