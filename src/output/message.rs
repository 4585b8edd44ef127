//! Singer protocol messages

use crate::streams::StreamDefinition;
use crate::types::{JsonValue, Record};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

/// One message of the output sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Declares the shape of a stream's records
    Schema {
        /// Stream name
        stream: String,
        /// JSON Schema of the records
        schema: JsonValue,
        /// Primary key fields
        key_properties: Vec<String>,
    },
    /// One extracted record
    Record {
        /// Stream name
        stream: String,
        /// Projected record
        record: Record,
        /// Extraction timestamp
        time_extracted: DateTime<Utc>,
    },
    /// Checkpoint
    State {
        /// State payload
        value: JsonValue,
    },
}

impl Message {
    /// SCHEMA message for a stream definition
    pub fn schema(stream: &StreamDefinition) -> Self {
        Self::Schema {
            stream: stream.name.clone(),
            schema: stream.schema.to_json_schema(),
            key_properties: stream.primary_keys.clone(),
        }
    }

    /// RECORD message stamped with the current time
    pub fn record(stream: impl Into<String>, record: Record) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Utc::now(),
        }
    }

    /// STATE message
    pub fn state(value: JsonValue) -> Self {
        Self::State { value }
    }

    /// Final state of a full-table run: no bookmarks
    pub fn empty_state() -> Self {
        Self::state(json!({ "bookmarks": {} }))
    }

    /// Stream the message belongs to
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}
