//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by the fetcher.

use crate::decode::Document;
use std::collections::HashMap;
use std::fmt;

/// Opaque pagination continuation token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wrap a cursor; empty tokens are not cursors
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// The raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available from this cursor
    Continue(PageCursor),
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Cursor for the next request, `None` on the first page
    pub cursor: Option<PageCursor>,
    /// Pages successfully fetched
    pub pages_fetched: u32,
    /// Primary resources seen so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
        self.cursor = None;
    }

    /// Set cursor
    pub fn set_cursor(&mut self, cursor: PageCursor) {
        self.cursor = Some(cursor);
    }

    /// Record a fetched page
    pub fn add_page(&mut self, records: usize) {
        self.pages_fetched += 1;
        self.total_fetched += records as u64;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Query parameters carrying the current cursor, empty on the first page
    fn request_params(&self, state: &PaginationState) -> HashMap<String, String>;

    /// Process a response document and determine if there's a next page
    fn process_response(&self, document: &Document, state: &mut PaginationState) -> NextPage;
}
