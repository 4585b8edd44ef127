//! Dependency orchestrator
//!
//! Walks the stream forest depth-first. Each root stream is swept page by
//! page; every record is emitted and then each child stream is swept to
//! completion with the context derived from that record, before the next
//! parent record is handled. The walk keeps an explicit stack of frames, one
//! per active sweep, so nesting depth never grows the async call stack.

use super::executor::{StreamExecutor, StreamReader};
use super::types::SyncStats;
use crate::auth::AuthConfig;
use crate::config::TapConfig;
use crate::decode::JsonDecoder;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::output::{Message, MessageSink};
use crate::pagination::{OffsetPaginator, Paginator};
use crate::streams::{discover_streams, StreamDefinition, StreamRegistry};
use crate::types::{Context, JsonValue, Record, StringMap};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Path requested by the connection check
const CHECK_PATH: &str = "/api/v3/projects/";

/// Read the Docs tap: active streams plus the HTTP machinery to read them
pub struct Tap {
    config: TapConfig,
    registry: StreamRegistry,
    client: HttpClient,
    paginator: OffsetPaginator,
    decoder: JsonDecoder,
    params: StringMap,
    selection: Option<HashSet<String>>,
}

/// One active sweep on the walk stack
struct Frame<'a> {
    reader: StreamReader<'a>,
    emit: bool,
    children: Vec<&'a StreamDefinition>,
    buffer: VecDeque<Record>,
}

/// Bookkeeping for one run
#[derive(Default)]
struct RunState {
    schemas_sent: HashSet<String>,
    seen_keys: HashMap<String, HashSet<String>>,
    stats: SyncStats,
}

impl Tap {
    /// Create a tap with the default HTTP settings
    pub fn new(config: TapConfig) -> Result<Self> {
        Self::with_client_config(config, HttpClientConfig::default())
    }

    /// Create a tap with custom HTTP settings.
    ///
    /// Base URL, user agent and credentials always come from `config`.
    pub fn with_client_config(config: TapConfig, mut http: HttpClientConfig) -> Result<Self> {
        config.validate()?;

        http.base_url = Some(config.api_url.clone());
        if let Some(agent) = &config.user_agent {
            http.user_agent.clone_from(agent);
        }
        let client = HttpClient::with_auth(http, AuthConfig::api_token(&config.token))?;
        let registry = StreamRegistry::new(discover_streams(config.include_business_streams))?;

        let mut params = StringMap::new();
        params.insert("expand".to_string(), "config".to_string());

        Ok(Self {
            config,
            registry,
            client,
            paginator: OffsetPaginator::default(),
            decoder: JsonDecoder::new(),
            params,
            selection: None,
        })
    }

    /// Restrict the run to the named streams.
    ///
    /// Unknown names are rejected. Parents of selected streams are still
    /// swept to derive contexts but emit nothing.
    pub fn with_selection<I, S>(mut self, streams: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = HashSet::new();
        for name in streams {
            let name = name.into();
            self.registry.require(&name)?;
            selection.insert(name);
        }
        self.selection = Some(selection);
        Ok(self)
    }

    /// Replace the paginator (page size)
    #[must_use]
    pub fn with_paginator(mut self, paginator: OffsetPaginator) -> Self {
        self.paginator = paginator;
        self
    }

    /// Tap configuration
    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Active stream definitions
    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    /// HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Whether a stream's records are emitted
    pub fn is_selected(&self, stream: &str) -> bool {
        self.selection
            .as_ref()
            .map_or(true, |selected| selected.contains(stream))
    }

    /// Whether a stream must be swept: it or one of its descendants is selected
    fn needs_sweep(&self, stream: &StreamDefinition) -> bool {
        self.registry
            .subtree_any(&stream.name, &|s: &StreamDefinition| self.is_selected(&s.name))
    }

    /// Issue one authenticated request against the projects endpoint
    pub async fn check(&self) -> Result<()> {
        let mut request = RequestConfig::new();
        for (key, value) in self.paginator.page_params(self.paginator.first_token()) {
            request = request.query(key, value);
        }
        request = request.query("limit", "1");

        self.client
            .get_json_with_config(CHECK_PATH, request)
            .await
            .map_err(|e| e.with_path(CHECK_PATH))?;
        Ok(())
    }

    /// Run every selected stream and write the messages to `sink`
    pub async fn run(&self, sink: &mut dyn MessageSink) -> Result<SyncStats> {
        let start = Instant::now();
        let executor = StreamExecutor::new(&self.client, &self.paginator, &self.decoder, &self.params);
        let mut run = RunState::default();

        for root in self.registry.roots() {
            if !self.needs_sweep(root) {
                debug!(stream = %root.name, "Skipping unselected stream");
                continue;
            }
            info!(stream = %root.name, "Beginning full table sync");
            self.walk(&executor, root, sink, &mut run).await?;
            info!(
                stream = %root.name,
                records = run.stats.records_for(&root.name),
                "Finished stream"
            );
        }

        sink.write(&Message::empty_state()).await?;
        sink.flush().await?;

        run.stats.requests_sent = self.client.requests_sent();
        run.stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            records = run.stats.total_records(),
            pages = run.stats.pages_fetched,
            requests = run.stats.requests_sent,
            duration_ms = run.stats.duration_ms,
            "Sync completed"
        );
        for (stream, count) in &run.stats.records {
            info!(stream = %stream, records = count, "Stream summary");
        }

        Ok(run.stats)
    }

    async fn walk<'a>(
        &'a self,
        executor: &StreamExecutor<'a>,
        root: &'a StreamDefinition,
        sink: &mut dyn MessageSink,
        run: &mut RunState,
    ) -> Result<()> {
        let mut stack = vec![self.open_frame(executor, root, None, run)?];

        while let Some(frame) = stack.last_mut() {
            if let Some(record) = frame.buffer.pop_front() {
                let stream = frame.reader.stream();
                let emit = frame.emit;
                let children = frame.children.clone();

                let context = (!children.is_empty()).then(|| stream.child_context_for(&record));

                let written = if emit {
                    self.emit_record(stream, record, sink, run).await?
                } else {
                    true
                };
                if !written {
                    continue;
                }

                match context {
                    Some(Some(context)) => {
                        let mut frames = children
                            .into_iter()
                            .map(|child| self.open_frame(executor, child, Some(context.clone()), run))
                            .collect::<Result<Vec<_>>>()?;
                        // First declared child ends up on top.
                        frames.reverse();
                        stack.extend(frames);
                    }
                    Some(None) => {
                        warn!(
                            stream = %stream.name,
                            "Record yielded no child context, skipping child streams"
                        );
                        run.stats.add_skipped_context();
                    }
                    None => {}
                }
                continue;
            }

            let stream = frame.reader.stream();
            if frame.emit && !run.schemas_sent.contains(&stream.name) {
                run.schemas_sent.insert(stream.name.clone());
                sink.write(&Message::schema(stream)).await?;
            }

            let page = frame.reader.next_page().await?;
            match page {
                Some(records) => {
                    run.stats.add_page();
                    frame.buffer.extend(records);
                }
                None => {
                    stack.pop();
                }
            }
        }

        Ok(())
    }

    fn open_frame<'a>(
        &'a self,
        executor: &StreamExecutor<'a>,
        stream: &'a StreamDefinition,
        context: Option<Context>,
        run: &mut RunState,
    ) -> Result<Frame<'a>> {
        match &context {
            Some(context) => debug!(stream = %stream.name, %context, "Starting sweep"),
            None => debug!(stream = %stream.name, "Starting sweep"),
        }
        run.stats.add_sweep();

        let children = self
            .registry
            .children(&stream.name)
            .into_iter()
            .filter(|child| self.needs_sweep(child))
            .collect();

        Ok(Frame {
            reader: executor.reader(stream, context)?,
            emit: self.is_selected(&stream.name),
            children,
            buffer: VecDeque::new(),
        })
    }

    /// Write one record; returns false when it was skipped
    async fn emit_record(
        &self,
        stream: &StreamDefinition,
        record: Record,
        sink: &mut dyn MessageSink,
        run: &mut RunState,
    ) -> Result<bool> {
        let key = match primary_key(stream, &record) {
            Ok(key) => key,
            Err(field) => {
                warn!(stream = %stream.name, field, "Skipping record without primary key");
                run.stats.add_missing_key();
                return Ok(false);
            }
        };

        let seen = run.seen_keys.entry(stream.name.clone()).or_default();
        if !seen.insert(key.clone()) {
            warn!(stream = %stream.name, key = %key, "Skipping duplicate record");
            run.stats.add_duplicate();
            return Ok(false);
        }

        sink.write(&Message::record(&stream.name, record)).await?;
        run.stats.add_record(&stream.name);
        Ok(true)
    }
}

/// Serialized primary-key tuple of a record, or the first key field that is
/// missing or null
fn primary_key<'a>(
    stream: &'a StreamDefinition,
    record: &Record,
) -> std::result::Result<String, &'a str> {
    let mut values = Vec::with_capacity(stream.primary_keys.len());
    for field in &stream.primary_keys {
        match record.get(field) {
            Some(value) if !value.is_null() => values.push(value.clone()),
            _ => return Err(field),
        }
    }
    Ok(JsonValue::Array(values).to_string())
}
