//! Message sinks
//!
//! The run hands every message to a [`MessageSink`]. [`JsonLinesWriter`]
//! writes the Singer wire format, one JSON object per line;
//! [`MemorySink`] collects messages for inspection.

use super::message::Message;
use crate::error::{Error, Result};
use crate::types::Record;
use async_trait::async_trait;
use std::io::{BufWriter, Stdout, Write};

/// Consumer of the emitted message sequence
#[async_trait]
pub trait MessageSink: Send {
    /// Accept one message
    async fn write(&mut self, message: &Message) -> Result<()>;

    /// Flush buffered output
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes messages as JSON lines
pub struct JsonLinesWriter<W: Write + Send> {
    writer: W,
    messages_written: usize,
}

impl JsonLinesWriter<BufWriter<Stdout>> {
    /// Writer on standard output
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(std::io::stdout()))
    }
}

impl<W: Write + Send> JsonLinesWriter<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            messages_written: 0,
        }
    }

    /// Number of messages written so far
    pub fn messages_written(&self) -> usize {
        self.messages_written
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)
            .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| Error::output(format!("Failed to write message: {e}")))?;
        self.messages_written += 1;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> MessageSink for JsonLinesWriter<W> {
    async fn write(&mut self, message: &Message) -> Result<()> {
        self.write_line(message)?;
        // Downstream targets checkpoint on STATE, so it must not sit in a buffer.
        if message.is_state() {
            self.writer
                .flush()
                .map_err(|e| Error::output(format!("Failed to flush output: {e}")))?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::output(format!("Failed to flush output: {e}")))
    }
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Vec<Message>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message, in emission order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Records of one stream, in emission order
    pub fn records(&self, stream: &str) -> Vec<&Record> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Stream name of every record message, in emission order
    pub fn record_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.is_record())
            .filter_map(Message::stream)
            .collect()
    }

    /// Streams that received a SCHEMA message, in emission order
    pub fn schema_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.is_schema())
            .filter_map(Message::stream)
            .collect()
    }
}

#[async_trait]
impl MessageSink for MemorySink {
    async fn write(&mut self, message: &Message) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}
