//! JSON:API document types
//!
//! Only the members the sync reads are modelled. Attributes stay as a raw
//! JSON object so unexpected fields never fail decoding.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A top-level JSON:API response document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Primary resources
    #[serde(default)]
    pub data: Option<Vec<Resource>>,
    /// Side-loaded entities requested with `include=`
    #[serde(default)]
    pub included: Option<Vec<Resource>>,
    /// Pagination links
    #[serde(default)]
    pub links: Option<Links>,
}

impl Document {
    /// Parse a document from a response body
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("invalid JSON:API document: {e}")))
    }

    /// Primary resources, empty when `data` is missing or null
    pub fn primary(&self) -> &[Resource] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Side-loaded entities, empty when `included` is missing or null
    pub fn included(&self) -> &[Resource] {
        self.included.as_deref().unwrap_or_default()
    }

    /// The `links.next` URL, if any
    pub fn next_link(&self) -> Option<&str> {
        self.links.as_ref().and_then(|l| l.next.as_deref())
    }
}

/// Pagination links of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    /// Link to the next page
    #[serde(default)]
    pub next: Option<String>,
}

/// A resource object (primary or side-loaded)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource type (e.g. "campaign", "tag")
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Resource id
    pub id: String,
    /// Attribute object
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Relationships keyed by name
    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
}

impl Resource {
    /// String attribute by name
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// Identifiers linked through a relationship, in document order
    pub fn related(&self, relationship: &str) -> &[ResourceIdentifier] {
        self.relationships
            .get(relationship)
            .and_then(|r| r.data.as_ref())
            .map(Linkage::identifiers)
            .unwrap_or_default()
    }
}

/// A relationship object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Resource linkage, `None` when absent or null
    #[serde(default)]
    pub data: Option<Linkage>,
}

/// Resource linkage: to-many or to-one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    /// To-many relationship
    Many(Vec<ResourceIdentifier>),
    /// To-one relationship
    One(ResourceIdentifier),
}

impl Linkage {
    /// Linked identifiers as a slice
    pub fn identifiers(&self) -> &[ResourceIdentifier] {
        match self {
            Linkage::Many(ids) => ids,
            Linkage::One(id) => std::slice::from_ref(id),
        }
    }
}

/// A resource identifier object (`{type, id}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    /// Resource type, optional in some responses
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Resource id
    pub id: String,
}
