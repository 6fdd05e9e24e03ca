//! Pagination strategy implementations

use super::types::{NextPage, PageCursor, PaginationState, Paginator};
use crate::decode::Document;
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Query parameter carrying the JSON:API cursor
pub const DEFAULT_CURSOR_PARAM: &str = "page[cursor]";

/// Cursor pagination through the `links.next` URL (e.g., Klaviyo)
///
/// The next link looks like `.../campaigns/?page%5Bcursor%5D=bmV4dA`; the
/// decoded value of the cursor parameter is sent back on the next request.
#[derive(Debug, Clone)]
pub struct LinkCursorPaginator {
    /// Query parameter name for cursor
    pub cursor_param: String,
}

impl Default for LinkCursorPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_CURSOR_PARAM)
    }
}

impl LinkCursorPaginator {
    /// Create a new link cursor paginator
    pub fn new(cursor_param: impl Into<String>) -> Self {
        Self {
            cursor_param: cursor_param.into(),
        }
    }
}

impl Paginator for LinkCursorPaginator {
    fn request_params(&self, state: &PaginationState) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(cursor) = &state.cursor {
            params.insert(self.cursor_param.clone(), cursor.as_str().to_string());
        }
        params
    }

    fn process_response(&self, document: &Document, state: &mut PaginationState) -> NextPage {
        state.add_page(document.primary().len());

        let Some(link) = document.next_link() else {
            debug!("No next link, pagination complete");
            state.mark_done();
            return NextPage::Done;
        };

        match extract_cursor(link, &self.cursor_param) {
            Some(cursor) => {
                state.set_cursor(cursor.clone());
                NextPage::Continue(cursor)
            }
            None => {
                warn!(
                    "Next link has no usable '{}' parameter, stopping: {}",
                    self.cursor_param, link
                );
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

/// Extract a cursor query parameter from a pagination link
///
/// Relative links are resolved against a placeholder base since only the
/// query string matters. Returns `None` if the link cannot be parsed or the
/// parameter is missing or empty.
pub fn extract_cursor(link: &str, param: &str) -> Option<PageCursor> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
            .and_then(|base| base.join(link))
            .ok()?,
        Err(_) => return None,
    };

    url.query_pairs()
        .find(|(key, _)| key == param)
        .and_then(|(_, value)| PageCursor::new(value.into_owned()))
}
