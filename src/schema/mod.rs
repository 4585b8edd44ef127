//! Schema module
//!
//! Declarative stream schemas built from typed property lists.
//!
//! # Features
//!
//! - **Property DSL**: `Property::new("id", PropertyType::Integer)` and friends
//! - **JSON Schema Output**: Singer-style schemas with nullable types
//! - **Projection**: Records are projected onto their schema; fields the
//!   schema does not declare are dropped unless an object allows additional
//!   properties

mod projection;
mod types;

pub use projection::Projection;
pub use types::{JsonType, Property, PropertyType, Schema};
