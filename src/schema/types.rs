//! Schema types

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON Schema primitive type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Number => write!(f, "number"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Object => write!(f, "object"),
            JsonType::Array => write!(f, "array"),
            JsonType::Null => write!(f, "null"),
        }
    }
}

/// Declared shape of a property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    /// String with `date-time` format
    DateTime,
    /// Object with declared properties
    Object {
        properties: Vec<Property>,
        additional_properties: bool,
    },
    /// Array of one item type
    Array(Box<PropertyType>),
}

impl PropertyType {
    /// Object type with the given properties; undeclared keys are dropped
    pub fn object(properties: Vec<Property>) -> Self {
        Self::Object {
            properties,
            additional_properties: false,
        }
    }

    /// Object type with the given properties that also keeps undeclared keys
    pub fn open_object(properties: Vec<Property>) -> Self {
        Self::Object {
            properties,
            additional_properties: true,
        }
    }

    /// Free-form object: renders as `{"properties": {}}` and keeps every key
    pub fn any_object() -> Self {
        Self::object(Vec::new())
    }

    /// Array of `items`
    pub fn array(items: PropertyType) -> Self {
        Self::Array(Box::new(items))
    }

    /// Underlying JSON type
    pub fn json_type(&self) -> JsonType {
        match self {
            Self::String | Self::DateTime => JsonType::String,
            Self::Integer => JsonType::Integer,
            Self::Number => JsonType::Number,
            Self::Boolean => JsonType::Boolean,
            Self::Object { .. } => JsonType::Object,
            Self::Array(_) => JsonType::Array,
        }
    }

    /// JSON Schema for this type; `nullable` adds `"null"` to the type list
    pub fn to_json_schema(&self, nullable: bool) -> Value {
        let json_type = self.json_type().to_string();
        let type_value = if nullable {
            json!([json_type, "null"])
        } else {
            json!([json_type])
        };

        let mut schema = Map::new();
        schema.insert("type".to_string(), type_value);

        match self {
            Self::DateTime => {
                schema.insert("format".to_string(), json!("date-time"));
            }
            Self::Object {
                properties,
                additional_properties,
            } => {
                schema.insert("properties".to_string(), properties_to_json(properties));
                if *additional_properties {
                    schema.insert("additionalProperties".to_string(), json!(true));
                }
            }
            Self::Array(items) => {
                schema.insert("items".to_string(), items.to_json_schema(false));
            }
            _ => {}
        }

        Value::Object(schema)
    }
}

/// One named property
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Field name
    pub name: String,
    /// Declared type
    pub property_type: PropertyType,
    /// Whether the field must be present
    pub required: bool,
    /// Whether the value is a credential
    pub secret: bool,
    /// Human-readable description
    pub description: Option<String>,
    /// Example values
    pub examples: Vec<Value>,
    /// Default value
    pub default: Option<Value>,
}

impl Property {
    /// Create an optional, nullable property
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            required: false,
            secret: false,
            description: None,
            examples: Vec::new(),
            default: None,
        }
    }

    /// Mark as required (and non-nullable)
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as a secret
    #[must_use]
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Set description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set example values
    #[must_use]
    pub fn examples<I, V>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Set default value
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// JSON Schema for this property
    pub fn to_json_schema(&self) -> Value {
        let mut schema = self.property_type.to_json_schema(!self.required);
        if let Value::Object(map) = &mut schema {
            if let Some(description) = &self.description {
                map.insert("description".to_string(), json!(description));
            }
            if !self.examples.is_empty() {
                map.insert("examples".to_string(), Value::Array(self.examples.clone()));
            }
            if let Some(default) = &self.default {
                map.insert("default".to_string(), default.clone());
            }
            if self.secret {
                map.insert("secret".to_string(), json!(true));
                map.insert("writeOnly".to_string(), json!(true));
            }
        }
        schema
    }
}

fn properties_to_json(properties: &[Property]) -> Value {
    let map: Map<String, Value> = properties
        .iter()
        .map(|p| (p.name.clone(), p.to_json_schema()))
        .collect();
    Value::Object(map)
}

/// Ordered list of top-level properties describing one stream's records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    properties: Vec<Property>,
}

impl Schema {
    /// Create a schema from an ordered property list
    pub fn new(properties: Vec<Property>) -> Self {
        Self { properties }
    }

    /// Declared properties, in order
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Look up a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Whether a top-level field is declared
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Top-level field names, in order
    pub fn field_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }

    /// Names of required properties
    pub fn required(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Render as a JSON Schema document
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), properties_to_json(&self.properties));
        let required = self.required();
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        Value::Object(schema)
    }
}

impl From<Vec<Property>> for Schema {
    fn from(properties: Vec<Property>) -> Self {
        Self::new(properties)
    }
}
