//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Singer tap for the Read the Docs API
#[derive(Parser, Debug)]
#[command(name = "tap-readthedocs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON (takes precedence over --config)
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// Fill missing config keys from TAP_READTHEDOCS_* environment variables
    #[arg(long, global = true)]
    pub config_env: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the config JSON Schema
    Spec,

    /// Test the connection to the API
    Check,

    /// Print the stream catalog
    Discover,

    /// List available stream names
    Streams,

    /// Extract records as Singer messages
    Read {
        /// Catalog file; only selected streams are read
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Streams to read (comma-separated, empty = all)
        #[arg(long, value_delimiter = ',')]
        streams: Vec<String>,
    },
}
