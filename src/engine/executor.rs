//! Stream executor
//!
//! A [`StreamReader`] performs one pagination sweep of one stream for one
//! context. Pages are fetched lazily: the next request is only sent when the
//! caller asks for the next page.

use crate::decode::RecordDecoder;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{PaginationState, Paginator};
use crate::streams::StreamDefinition;
use crate::template;
use crate::types::{Context, Record, StringMap};
use tracing::debug;

/// Shared request machinery for every sweep of a run
pub struct StreamExecutor<'a> {
    client: &'a HttpClient,
    paginator: &'a dyn Paginator,
    decoder: &'a dyn RecordDecoder,
    params: &'a StringMap,
}

impl<'a> StreamExecutor<'a> {
    /// Create an executor; `params` are sent with every page request
    pub fn new(
        client: &'a HttpClient,
        paginator: &'a dyn Paginator,
        decoder: &'a dyn RecordDecoder,
        params: &'a StringMap,
    ) -> Self {
        Self {
            client,
            paginator,
            decoder,
            params,
        }
    }

    /// Start a sweep of `stream` for `context`.
    ///
    /// Fails if the path references a variable the context does not carry.
    pub fn reader(
        &self,
        stream: &'a StreamDefinition,
        context: Option<Context>,
    ) -> Result<StreamReader<'a>> {
        let path = template::render(&stream.path, context.as_ref())?;
        Ok(StreamReader {
            client: self.client,
            paginator: self.paginator,
            decoder: self.decoder,
            params: self.params,
            stream,
            context,
            path,
            state: PaginationState::start(self.paginator),
        })
    }
}

/// One pagination sweep of a (stream, context) pair
pub struct StreamReader<'a> {
    client: &'a HttpClient,
    paginator: &'a dyn Paginator,
    decoder: &'a dyn RecordDecoder,
    params: &'a StringMap,
    stream: &'a StreamDefinition,
    context: Option<Context>,
    path: String,
    state: PaginationState,
}

impl<'a> StreamReader<'a> {
    /// The stream being read
    pub fn stream(&self) -> &'a StreamDefinition {
        self.stream
    }

    /// Context of this sweep
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Rendered request path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Pagination progress
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Fetch the next page.
    ///
    /// Returns `None` once the paginator has signalled the end. Records are
    /// post-processed, merged with the context and projected onto the
    /// stream's schema. A failed request carries the rendered path.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Record>>> {
        if self.state.done {
            return Ok(None);
        }

        let token = self.state.token;
        let mut request = RequestConfig::new();
        for (key, value) in self.paginator.page_params(token) {
            request = request.query(key, value);
        }
        for (key, value) in self.params {
            request = request.query(key, value);
        }

        debug!(
            stream = %self.stream.name,
            path = %self.path,
            token,
            "Fetching page"
        );

        let body = self
            .client
            .get_json_with_config(&self.path, request)
            .await
            .map_err(|e| e.with_path(&self.path))?;

        let raw = self.decoder.decode_value(&body)?;
        self.state.advance(self.paginator, raw.len());

        let mut records = Vec::with_capacity(raw.len());
        for record in raw {
            let Some(mut record) = self.stream.apply_post_process(record)? else {
                continue;
            };
            if let Some(context) = &self.context {
                context.merge_into(&mut record);
            }

            let projection = self.stream.schema.project(record);
            if !projection.dropped.is_empty() {
                debug!(
                    stream = %self.stream.name,
                    fields = ?projection.dropped,
                    "Dropped undeclared fields"
                );
            }
            records.push(projection.record);
        }

        debug!(
            stream = %self.stream.name,
            page = self.state.pages,
            records = records.len(),
            "Page decoded"
        );

        Ok(Some(records))
    }
}
