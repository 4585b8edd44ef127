//! Pagination types and traits

use crate::types::PageToken;
use std::collections::HashMap;

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Token for the first request of a sweep
    fn first_token(&self) -> PageToken;

    /// Compute the token for the next page, or `None` when the sweep is done.
    ///
    /// Pure: the result depends only on the arguments.
    fn next_token(&self, previous: PageToken, last_page_record_count: usize)
        -> Option<PageToken>;

    /// Query parameters that request the page identified by `token`
    fn page_params(&self, token: PageToken) -> HashMap<String, String>;
}

/// Tracks pagination state during one sweep
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Token of the next page to request
    pub token: PageToken,
    /// Pages fetched so far
    pub pages: u64,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a state positioned on the paginator's first page
    pub fn start(paginator: &dyn Paginator) -> Self {
        Self {
            token: paginator.first_token(),
            ..Default::default()
        }
    }

    /// Record a fetched page and advance the token
    pub fn advance(&mut self, paginator: &dyn Paginator, records_count: usize) {
        self.pages += 1;
        self.total_fetched += records_count as u64;
        match paginator.next_token(self.token, records_count) {
            Some(next) => self.token = next,
            None => self.done = true,
        }
    }
}
