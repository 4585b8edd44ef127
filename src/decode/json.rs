//! JSON decoder with JSONPath record extraction

use crate::error::{Error, Result};
use crate::types::Record;
use serde_json::Value;

/// Selector for the records array of a Read the Docs response envelope
pub const RESULTS_PATH: &str = "$.results[*]";

/// Trait for decoding response bodies into records
pub trait RecordDecoder: Send + Sync {
    /// Extract the records from an already-parsed response body
    fn decode_value(&self, body: &Value) -> Result<Vec<Record>>;
}

/// JSON decoder with a JSONPath record selector
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    /// JSONPath to extract records
    record_path: String,
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::with_path(RESULTS_PATH)
    }
}

impl JsonDecoder {
    /// Create a decoder for the `results` envelope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: path.into(),
        }
    }

    /// The configured selector
    pub fn record_path(&self) -> &str {
        &self.record_path
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode_value(&self, body: &Value) -> Result<Vec<Record>> {
        extract_with_jsonpath(body, &self.record_path)?
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(Error::decode(format!(
                    "Expected an object at {}[{index}], found {}",
                    self.record_path,
                    json_type_name(&other)
                ))),
            })
            .collect()
    }
}

fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath: {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
