//! Relationship flattening
//!
//! Turns nested campaign records into one row per (campaign, tag) pair for
//! tabular loading. Campaigns without tags produce no rows.

use crate::fetch::CampaignRecord;
use serde::{Deserialize, Serialize};

/// One (campaign, tag) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignTagRow {
    /// Campaign id
    pub campaign_id: String,
    /// Campaign name
    pub campaign_name: String,
    /// Tag id
    pub tag_id: String,
    /// Tag name, `None` when the tag was not side-loaded
    pub tag_name: Option<String>,
}

/// Flatten campaigns into rows, in campaign order then tag order
pub fn flatten(records: Vec<CampaignRecord>) -> Vec<CampaignTagRow> {
    let total: usize = records.iter().map(|r| r.tags.len()).sum();
    let mut rows = Vec::with_capacity(total);

    for record in records {
        for tag in record.tags {
            rows.push(CampaignTagRow {
                campaign_id: record.id.clone(),
                campaign_name: record.name.clone(),
                tag_id: tag.tag_id,
                tag_name: tag.tag_name,
            });
        }
    }

    rows
}
