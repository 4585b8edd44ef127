//! Record projection onto a schema
//!
//! The schema is a projection, not a contract: undeclared keys are removed
//! (and reported) instead of failing the run. Values are never coerced.

use super::types::{Property, PropertyType, Schema};
use crate::types::Record;
use serde_json::{Map, Value};

/// Result of projecting one record
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// The record with undeclared fields removed
    pub record: Record,
    /// Dotted paths of the fields that were dropped
    pub dropped: Vec<String>,
}

impl Schema {
    /// Project a record onto this schema.
    ///
    /// Top-level keys must be declared. Nested objects keep undeclared keys
    /// only when they allow additional properties; an object declared
    /// without properties keeps everything.
    pub fn project(&self, record: Record) -> Projection {
        let mut dropped = Vec::new();
        let record = project_object(self.properties(), false, record, "", &mut dropped);
        Projection { record, dropped }
    }
}

fn project_object(
    properties: &[Property],
    additional_properties: bool,
    object: Map<String, Value>,
    prefix: &str,
    dropped: &mut Vec<String>,
) -> Map<String, Value> {
    if properties.is_empty() && (additional_properties || !prefix.is_empty()) {
        return object;
    }

    let mut out = Map::new();
    for (key, value) in object {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match properties.iter().find(|p| p.name == key) {
            Some(property) => {
                let value = project_value(&property.property_type, value, &path, dropped);
                out.insert(key, value);
            }
            None if additional_properties => {
                out.insert(key, value);
            }
            None => dropped.push(path),
        }
    }
    out
}

fn project_value(
    property_type: &PropertyType,
    value: Value,
    path: &str,
    dropped: &mut Vec<String>,
) -> Value {
    match (property_type, value) {
        (
            PropertyType::Object {
                properties,
                additional_properties,
            },
            Value::Object(map),
        ) => Value::Object(project_object(
            properties,
            *additional_properties,
            map,
            path,
            dropped,
        )),
        (PropertyType::Array(items), Value::Array(values)) => Value::Array(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| project_value(items, v, &format!("{path}[{i}]"), dropped))
                .collect(),
        ),
        (_, other) => other,
    }
}
