//! Pagination module
//!
//! Supports cursor pagination driven by a JSON:API `links.next` URL.
//!
//! # Overview
//!
//! The listing endpoint encodes its continuation token as the `page[cursor]`
//! query parameter of `links.next`. The paginator pulls that token out of each
//! response and tracks when pagination is complete.

mod strategies;
mod types;

pub use strategies::{extract_cursor, LinkCursorPaginator, DEFAULT_CURSOR_PARAM};
pub use types::{NextPage, PageCursor, PaginationState, Paginator};
