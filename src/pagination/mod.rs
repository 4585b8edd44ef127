//! Pagination module
//!
//! # Overview
//!
//! Read the Docs list endpoints page with `limit`/`offset` query parameters.
//! A paginator turns the previous offset and the size of the page that just
//! came back into the next offset, or signals that the sweep is over.

mod offset;
mod types;

pub use offset::{OffsetPaginator, DEFAULT_PAGE_SIZE};
pub use types::{PaginationState, Paginator};
