//! Response decoding
//!
//! The campaign listing answers with a JSON:API document: primary resources
//! under `data`, side-loaded entities under `included` and pagination links
//! under `links`. This module holds the document types and the index used to
//! join relationship references back to side-loaded entities.

mod index;
mod types;

pub use index::IncludedIndex;
pub use types::{Document, Linkage, Links, Relationship, Resource, ResourceIdentifier};
