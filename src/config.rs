//! Tap configuration and stream catalog
//!
//! Configuration is a JSON object. It can come from a file, from inline JSON
//! or from `TAP_READTHEDOCS_*` environment variables. The catalog describes
//! the discovered streams and carries the per-stream `selected` flags that
//! restrict a run.

use crate::error::{Error, Result, ResultExt};
use crate::schema::{Property, PropertyType, Schema};
use crate::streams::StreamRegistry;
use crate::types::{JsonObject, JsonValue, OptionStringExt, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://readthedocs.org";

/// Prefix of the environment variables read by the env overlay
pub const ENV_PREFIX: &str = "TAP_READTHEDOCS_";

// ============================================================================
// Tap Config
// ============================================================================

/// Runtime configuration of the tap
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapConfig {
    /// Read the Docs API token
    pub token: String,

    /// Whether to include streams only available to business accounts
    #[serde(default)]
    pub include_business_streams: bool,

    /// API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// HTTP user agent override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("token", &"[REDACTED]")
            .field("include_business_streams", &self.include_business_streams)
            .field("api_url", &self.api_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl TapConfig {
    /// Create a config with defaults for everything but the token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            include_business_streams: false,
            api_url: default_api_url(),
            user_agent: None,
        }
    }

    /// Set the API base URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Enable or disable business-only streams
    #[must_use]
    pub fn with_business_streams(mut self, enabled: bool) -> Self {
        self.include_business_streams = enabled;
        self
    }

    /// Parse and validate a config object
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let JsonValue::Object(object) = value else {
            return Err(Error::config("config must be a JSON object"));
        };
        if !object.contains_key("token") {
            return Err(Error::missing_field("token"));
        }

        let config: Self = serde_json::from_value(JsonValue::Object(object))
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate inline config JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(parse_object(json, "config JSON")?.into())
    }

    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_value(read_object(path.as_ref())?.into())
    }

    /// Assemble the config from every source.
    ///
    /// Inline JSON wins over the file; environment variables only fill keys
    /// neither of them set.
    pub fn load(file: Option<&Path>, inline: Option<&str>, use_env: bool) -> Result<Self> {
        let mut object = JsonObject::new();
        if let Some(path) = file {
            object.extend(read_object(path)?);
        }
        if let Some(json) = inline {
            object.extend(parse_object(json, "config JSON")?);
        }
        if use_env {
            env_overlay(&mut object, |name| std::env::var(name).ok())?;
        }
        Self::from_value(JsonValue::Object(object))
    }

    /// Reject values the API cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::invalid_value("token", "must not be empty"));
        }
        url::Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;
        Ok(())
    }
}

fn parse_object(json: &str, what: &str) -> Result<JsonObject> {
    match serde_json::from_str(json) {
        Ok(JsonValue::Object(object)) => Ok(object),
        Ok(_) => Err(Error::config(format!("{what} must be a JSON object"))),
        Err(e) => Err(Error::config(format!("Invalid {what}: {e}"))),
    }
}

fn read_object(path: &Path) -> Result<JsonObject> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;
    parse_object(&content, "config file")
}

/// Fill keys missing from `object` with `TAP_READTHEDOCS_<KEY>` values
pub fn env_overlay<F>(object: &mut JsonObject, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    for key in ["token", "include_business_streams", "api_url", "user_agent"] {
        if object.contains_key(key) {
            continue;
        }
        let name = format!("{ENV_PREFIX}{}", key.to_uppercase());
        let Some(raw) = lookup(&name).none_if_empty() else {
            continue;
        };

        let value = if key == "include_business_streams" {
            JsonValue::Bool(parse_bool(key, &raw)?)
        } else {
            JsonValue::String(raw)
        };
        object.insert(key.to_string(), value);
    }
    Ok(())
}

fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::invalid_value(
            field,
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// JSON Schema of the config object, as printed by `spec`
pub fn config_schema() -> Schema {
    Schema::new(vec![
        Property::new("token", PropertyType::String)
            .required()
            .secret()
            .description("Read the Docs API token"),
        Property::new("include_business_streams", PropertyType::Boolean)
            .description(
                "Whether to include streams available only to ReadTheDocs for Business accounts.",
            )
            .default_value(false),
        Property::new("api_url", PropertyType::String)
            .description("Base URL of the Read the Docs API")
            .default_value(DEFAULT_API_URL),
        Property::new("user_agent", PropertyType::String)
            .description("User agent sent with every request"),
    ])
}

// ============================================================================
// Catalog
// ============================================================================

/// Stream catalog, as printed by `discover` and read by `read --catalog`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog entries
    pub streams: Vec<CatalogEntry>,
}

/// One stream of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,
    /// Stream name
    pub stream: String,
    /// JSON Schema of the records
    #[serde(default)]
    pub schema: JsonValue,
    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// Parent stream name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_stream: Option<String>,
    /// Replication method
    #[serde(default)]
    pub replication_method: ReplicationMethod,
    /// Metadata entries
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// Metadata for one breadcrumb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Empty for the stream, `["properties", name]` for a field
    #[serde(default)]
    pub breadcrumb: Vec<String>,
    /// Metadata values
    pub metadata: Metadata,
}

/// Metadata values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Selection flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    /// `available` or `automatic`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<String>,
    /// Primary key fields
    #[serde(
        rename = "table-key-properties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub table_key_properties: Option<Vec<String>>,
    /// Keys this tap does not interpret
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Catalog {
    /// Catalog of every stream in the registry, all selected
    pub fn discover(registry: &StreamRegistry) -> Self {
        let streams = registry
            .iter()
            .map(|stream| {
                let mut metadata = vec![MetadataEntry {
                    breadcrumb: Vec::new(),
                    metadata: Metadata {
                        selected: Some(true),
                        inclusion: Some("available".to_string()),
                        table_key_properties: Some(stream.primary_keys.clone()),
                        extra: JsonObject::new(),
                    },
                }];
                metadata.extend(stream.schema.field_names().into_iter().map(|field| {
                    let inclusion = if stream.primary_keys.iter().any(|k| k == field) {
                        "automatic"
                    } else {
                        "available"
                    };
                    MetadataEntry {
                        breadcrumb: vec!["properties".to_string(), field.to_string()],
                        metadata: Metadata {
                            inclusion: Some(inclusion.to_string()),
                            ..Metadata::default()
                        },
                    }
                }));

                CatalogEntry {
                    tap_stream_id: stream.name.clone(),
                    stream: stream.name.clone(),
                    schema: stream.schema.to_json_schema(),
                    key_properties: stream.primary_keys.clone(),
                    parent_stream: stream.parent.clone(),
                    replication_method: ReplicationMethod::FullTable,
                    metadata,
                }
            })
            .collect();

        Self { streams }
    }

    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid catalog: {e}")))
    }

    /// Load a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file '{}'", path.display()))?;
        Self::from_json(&content)
    }

    /// Names of the streams whose stream-level metadata is selected
    pub fn selected_streams(&self) -> Vec<String> {
        self.streams
            .iter()
            .filter(|entry| entry.is_selected())
            .map(|entry| entry.tap_stream_id.clone())
            .collect()
    }
}

impl CatalogEntry {
    /// Whether the stream-level metadata marks this stream selected
    pub fn is_selected(&self) -> bool {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .and_then(|m| m.metadata.selected)
            .unwrap_or(false)
    }
}
