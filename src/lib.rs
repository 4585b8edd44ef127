// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-readthedocs
//!
//! Singer tap for the Read the Docs API v3.
//!
//! Extracts projects and their versions, builds, redirects, subprojects and
//! translations, plus organizations for Read the Docs for Business accounts,
//! and writes them as Singer SCHEMA / RECORD / STATE messages.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_readthedocs::{config::TapConfig, engine::Tap, output::JsonLinesWriter, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = TapConfig::new("my-token");
//!     let tap = Tap::new(config)?.with_selection(["projects", "versions"])?;
//!
//!     let mut sink = JsonLinesWriter::stdout();
//!     let stats = tap.run(&mut sink).await?;
//!     eprintln!("{} records", stats.total_records());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Tap (orchestrator)                       │
//! │   registry of streams → depth-first walk → MessageSink          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │  Streams  │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Token    │ GET       │ Offset        │ Parent    │ Singer JSON │
//! │ header   │ Retry     │ limit/offset  │ Context   │ Memory      │
//! │          │ Rate Limit│               │ Schema    │             │
//! │          │ Cache     │               │ Projection│             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication
pub mod auth;

/// HTTP client with retry, rate limiting and response cache
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Response decoders
pub mod decode;

/// Path template interpolation
pub mod template;

/// Schema declarations and record projection
pub mod schema;

/// Stream definitions and registry
pub mod streams;

/// Pagination sweeps and stream orchestration
pub mod engine;

/// Singer messages and sinks
pub mod output;

/// Tap configuration and catalog
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{Catalog, TapConfig};
pub use engine::Tap;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
