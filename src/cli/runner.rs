//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{config_schema, Catalog, TapConfig};
use crate::engine::Tap;
use crate::error::{Error, Result};
use crate::output::JsonLinesWriter;
use crate::streams::{discover_streams, StreamRegistry};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Streams => self.streams(),
            Commands::Read { catalog, streams } => {
                self.read(catalog.as_deref(), streams).await
            }
        }
    }

    /// Whether any config source was given on the command line
    fn has_config_source(&self) -> bool {
        self.cli.config.is_some() || self.cli.config_json.is_some() || self.cli.config_env
    }

    /// Load configuration from every source given on the command line
    fn load_config(&self) -> Result<TapConfig> {
        TapConfig::load(
            self.cli.config.as_deref(),
            self.cli.config_json.as_deref(),
            self.cli.config_env,
        )
    }

    /// Active streams; without any config source only the default streams
    fn registry(&self) -> Result<StreamRegistry> {
        let include_business_streams = if self.has_config_source() {
            self.load_config()?.include_business_streams
        } else {
            false
        };
        StreamRegistry::new(discover_streams(include_business_streams))
    }

    /// Show spec
    fn spec(&self) -> Result<()> {
        self.output_message(&json!({
            "type": "SPEC",
            "spec": config_schema().to_json_schema()
        }))
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let tap = Tap::new(self.load_config()?)?;
        info!(api_url = %tap.config().api_url, "Checking connection");

        match tap.check().await {
            Ok(()) => self.output_message(&json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "SUCCEEDED",
                    "message": "Connection successful"
                }
            })),
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }))?;
                Err(e)
            }
        }
    }

    /// Discover streams
    fn discover(&self) -> Result<()> {
        let registry = self.registry()?;
        self.output_message(&Catalog::discover(&registry))
    }

    /// List available streams (lightweight, no schemas)
    fn streams(&self) -> Result<()> {
        let registry = self.registry()?;
        self.output_message(&json!({
            "type": "STREAMS",
            "streams": registry.names()
        }))
    }

    /// Read records
    async fn read(&self, catalog: Option<&Path>, streams: &[String]) -> Result<()> {
        let config = self.load_config()?;
        let mut tap = Tap::new(config)?;

        if let Some(selection) = Self::selection(catalog, streams)? {
            debug!(streams = ?selection, "Stream selection");
            tap = tap.with_selection(selection)?;
        }

        let mut sink = JsonLinesWriter::stdout();
        let stats = tap.run(&mut sink).await?;
        debug!(messages = sink.messages_written(), ?stats, "Output finished");
        Ok(())
    }

    /// Streams selected by the catalog and/or `--streams`.
    ///
    /// Both filters apply when both are given; `None` selects everything.
    fn selection(catalog: Option<&Path>, streams: &[String]) -> Result<Option<Vec<String>>> {
        let requested: Vec<String> = streams
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let from_catalog = catalog
            .map(Catalog::from_file)
            .transpose()?
            .map(|c| c.selected_streams());

        Ok(match (from_catalog, requested.is_empty()) {
            (None, true) => None,
            (None, false) => Some(requested),
            (Some(selected), true) => Some(selected),
            (Some(selected), false) => Some(
                selected
                    .into_iter()
                    .filter(|name| requested.contains(name))
                    .collect(),
            ),
        })
    }

    /// Output a message
    fn output_message<T: Serialize>(&self, msg: &T) -> Result<()> {
        let line = serde_json::to_string(msg)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")
            .and_then(|()| stdout.flush())
            .map_err(|e| Error::output(format!("Failed to write to stdout: {e}")))
    }
}
