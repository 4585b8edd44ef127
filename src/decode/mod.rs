//! Response decoder module
//!
//! # Overview
//!
//! Read the Docs wraps every list response in an envelope
//! (`{"count": .., "next": .., "previous": .., "results": [..]}`). The decoder
//! pulls the record objects out of that envelope with a JSONPath selector.

mod json;

pub use json::{JsonDecoder, RecordDecoder, RESULTS_PATH};
