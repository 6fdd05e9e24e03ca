//! Lookup index over side-loaded entities

use super::types::Resource;
use std::collections::HashMap;

/// Maps the ids of one side-loaded entity type to a string attribute
///
/// Built once per page so resolving a relationship reference is a hash
/// lookup instead of a scan of `included`. When an id appears more than once
/// the first entity wins.
#[derive(Debug, Clone, Default)]
pub struct IncludedIndex<'a> {
    values: HashMap<&'a str, Option<&'a str>>,
}

impl<'a> IncludedIndex<'a> {
    /// Index entities of `kind` by id, keeping their `attribute` value
    pub fn build(included: &'a [Resource], kind: &str, attribute: &str) -> Self {
        let mut values = HashMap::with_capacity(included.len());
        for entity in included.iter().filter(|e| e.kind == kind) {
            values
                .entry(entity.id.as_str())
                .or_insert_with(|| entity.attribute_str(attribute));
        }
        Self { values }
    }

    /// Attribute value for an id; `None` if the entity or the attribute is missing
    pub fn get(&self, id: &str) -> Option<&'a str> {
        self.values.get(id).copied().flatten()
    }

    /// Whether an entity with this id was side-loaded
    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
