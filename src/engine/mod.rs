//! Execution engine module
//!
//! Pagination sweeps and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Tap` - builds the active stream set and runs the depth-first walk
//! - `StreamExecutor` / `StreamReader` - one lazy pagination sweep per (stream, context)
//! - `SyncStats` - run statistics

mod executor;
mod orchestrator;
mod types;

pub use executor::{StreamExecutor, StreamReader};
pub use orchestrator::Tap;
pub use types::SyncStats;

#[cfg(test)]
mod tests;
