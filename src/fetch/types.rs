//! Fetch types
//!
//! Campaign records as reassembled from the listing, and the filter that
//! selects which campaigns are listed.

use crate::decode::{IncludedIndex, Resource};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side-loaded entity type for tags
pub const TAG_TYPE: &str = "tag";

/// Relationship name linking a campaign to its tags
pub const TAGS_RELATIONSHIP: &str = "tags";

/// A campaign and its tags, in relationship order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRecord {
    /// Campaign id
    pub id: String,
    /// Campaign name
    pub name: String,
    /// Tags linked to the campaign
    pub tags: Vec<TagRef>,
}

impl CampaignRecord {
    /// Build a record from a primary resource, resolving tag names via the index
    pub fn from_resource(resource: &Resource, tags: &IncludedIndex<'_>) -> Result<Self> {
        let name = resource.attribute_str("name").ok_or_else(|| {
            Error::decode(format!(
                "campaign '{}' has no string 'name' attribute",
                resource.id
            ))
        })?;

        let tags = resource
            .related(TAGS_RELATIONSHIP)
            .iter()
            .map(|reference| TagRef {
                tag_id: reference.id.clone(),
                tag_name: tags.get(&reference.id).map(str::to_string),
            })
            .collect();

        Ok(Self {
            id: resource.id.clone(),
            name: name.to_string(),
            tags,
        })
    }
}

/// A tag reference on a campaign
///
/// `tag_name` is `None` when the response referenced the tag but did not
/// side-load a named entity for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    /// Tag id
    pub tag_id: String,
    /// Tag display name, if it was side-loaded
    pub tag_name: Option<String>,
}

/// Delivery channel of a campaign
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Email campaigns
    #[default]
    Email,
    /// SMS campaigns
    Sms,
    /// Mobile push campaigns
    MobilePush,
}

impl Channel {
    /// Wire name used in filter expressions
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::MobilePush => "mobile_push",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which campaigns to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignFilter {
    /// Campaigns sent on one channel (the API requires a channel filter)
    Channel(Channel),
    /// A raw filter expression passed through unchanged
    Expression(String),
}

impl Default for CampaignFilter {
    fn default() -> Self {
        Self::Channel(Channel::default())
    }
}

impl CampaignFilter {
    /// Value of the `filter` query parameter
    pub fn to_query_value(&self) -> String {
        match self {
            CampaignFilter::Channel(channel) => {
                format!("equals(messages.channel,\"{}\")", channel.as_str())
            }
            CampaignFilter::Expression(expr) => expr.clone(),
        }
    }
}

impl From<Channel> for CampaignFilter {
    fn from(channel: Channel) -> Self {
        Self::Channel(channel)
    }
}
