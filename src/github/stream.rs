use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{SearchItem, SearchSource};
use crate::error::ApiError;

/// Pull-based sequence of search results.
///
/// Each pull yields one of three outcomes: `Ok(Some(item))`, `Ok(None)` once
/// the results are exhausted, or `Err(_)` when the platform refused the
/// request. An error never advances the stream, so pulling again retries.
pub trait ItemStream: Send {
    fn next_item(&mut self) -> BoxFuture<'_, Result<Option<SearchItem>, ApiError>>;
}

/// Walks `/search/code` one page at a time, fetching only when the buffered
/// page has been drained.
pub struct SearchStream {
    source: Arc<dyn SearchSource>,
    query: String,
    per_page: u32,
    next_page: u32,
    fetched: u64,
    buffer: VecDeque<SearchItem>,
    exhausted: bool,
}

impl SearchStream {
    pub fn new(source: Arc<dyn SearchSource>, query: impl Into<String>, per_page: u32) -> Self {
        SearchStream {
            source,
            query: query.into(),
            per_page: per_page.clamp(1, 100),
            next_page: 1,
            fetched: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub async fn pull(&mut self) -> Result<Option<SearchItem>, ApiError> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            if self.exhausted {
                return Ok(None);
            }

            let page = match self
                .source
                .search_code(&self.query, self.next_page, self.per_page)
                .await
            {
                Ok(page) => page,
                // GitHub refuses to page past the first 1000 results.
                Err(ApiError::Status { status, .. })
                    if status == StatusCode::UNPROCESSABLE_ENTITY && self.next_page > 1 =>
                {
                    warn!("Reached search limit at page {}", self.next_page);
                    self.exhausted = true;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            let count = page.items.len() as u64;
            debug!(
                page = self.next_page,
                items = count,
                total = page.total_count,
                "Fetched search page"
            );
            if page.incomplete_results {
                warn!("Search page {} reported incomplete results", self.next_page);
            }

            self.fetched += count;
            self.next_page += 1;
            // Short pages happen mid-stream; only an empty page or the
            // reported total ends it.
            if count == 0 || self.fetched >= page.total_count {
                self.exhausted = true;
            }
            self.buffer.extend(page.items);
        }
    }
}

impl ItemStream for SearchStream {
    fn next_item(&mut self) -> BoxFuture<'_, Result<Option<SearchItem>, ApiError>> {
        self.pull().boxed()
    }
}
