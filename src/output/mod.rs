//! Output module
//!
//! Singer messages and the sinks that consume them.
//!
//! # Overview
//!
//! - [`Message`] - SCHEMA, RECORD and STATE messages
//! - [`MessageSink`] - consumer trait used by the tap
//! - [`JsonLinesWriter`] - Singer wire format on any `Write`
//! - [`MemorySink`] - in-memory sink for tests and embedding

mod message;
mod writer;

pub use message::Message;
pub use writer::{JsonLinesWriter, MemorySink, MessageSink};
