//! CLI module
//!
//! Command-line interface for the tap.
//!
//! # Commands
//!
//! - `spec` - Print the config JSON Schema
//! - `check` - Test the connection to the API
//! - `discover` - Print the stream catalog
//! - `streams` - List stream names
//! - `read` - Extract records

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
