//! Offset pagination
//!
//! `?limit=50&offset=100`: the offset advances by the page size for as long
//! as pages come back full.

use super::types::Paginator;
use crate::types::PageToken;
use std::collections::HashMap;

/// Default number of records requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Offset-based pagination
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Offset of the first page
    pub start_value: PageToken,
    /// Number of records per page
    pub page_size: u32,
}

impl Default for OffsetPaginator {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

impl OffsetPaginator {
    /// Create a paginator starting at `start_value`
    pub fn new(start_value: PageToken, page_size: u32) -> Self {
        Self {
            start_value,
            page_size,
        }
    }
}

impl Paginator for OffsetPaginator {
    fn first_token(&self) -> PageToken {
        self.start_value
    }

    fn next_token(&self, previous: PageToken, last_page_record_count: usize) -> Option<PageToken> {
        // A short (or empty) page is the last one.
        if self.page_size == 0 || last_page_record_count != self.page_size as usize {
            return None;
        }
        Some(previous + PageToken::from(self.page_size))
    }

    fn page_params(&self, token: PageToken) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("limit".to_string(), self.page_size.to_string());
        params.insert("offset".to_string(), token.to_string());
        params
    }
}
