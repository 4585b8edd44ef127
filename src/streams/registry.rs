//! Stream registry
//!
//! Definitions are stored in declaration order. Parent references are names
//! resolved against the same registry; construction fails if a name repeats,
//! a parent is missing, the parent links form a cycle, or a path needs a
//! variable no parent can supply.

use super::definition::StreamDefinition;
use crate::error::{Error, Result};
use crate::template;
use std::collections::HashSet;

/// Validated, read-only set of stream definitions
#[derive(Debug, Clone)]
pub struct StreamRegistry {
    streams: Vec<StreamDefinition>,
}

impl StreamRegistry {
    /// Build a registry, validating the stream graph
    pub fn new(streams: Vec<StreamDefinition>) -> Result<Self> {
        let registry = Self { streams };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for stream in &self.streams {
            if !seen.insert(stream.name.as_str()) {
                return Err(Error::stream_graph(format!(
                    "duplicate stream name '{}'",
                    stream.name
                )));
            }
        }

        for stream in &self.streams {
            if let Some(parent) = &stream.parent {
                if self.get(parent).is_none() {
                    return Err(Error::stream_graph(format!(
                        "stream '{}' declares unknown parent '{parent}'",
                        stream.name
                    )));
                }
            }
            self.check_acyclic(stream)?;
            self.check_path_variables(stream)?;
        }

        Ok(())
    }

    fn check_acyclic(&self, stream: &StreamDefinition) -> Result<()> {
        let mut visited = HashSet::new();
        let mut current = Some(stream);
        while let Some(def) = current {
            if !visited.insert(def.name.as_str()) {
                return Err(Error::stream_graph(format!(
                    "parent chain of '{}' contains a cycle",
                    stream.name
                )));
            }
            current = def.parent.as_deref().and_then(|p| self.get(p));
        }
        Ok(())
    }

    fn check_path_variables(&self, stream: &StreamDefinition) -> Result<()> {
        let variables = template::variables(&stream.path);
        if variables.is_empty() {
            return Ok(());
        }

        let supplied = stream
            .parent
            .as_deref()
            .and_then(|p| self.get(p))
            .is_some_and(|parent| parent.derive_child_context.is_some());

        if supplied {
            Ok(())
        } else {
            Err(Error::stream_graph(format!(
                "stream '{}' uses path variables [{}] but has no parent deriving a child context",
                stream.name,
                variables.join(", ")
            )))
        }
    }

    /// Look up a definition by name
    pub fn get(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Look up a definition by name, failing if absent
    pub fn require(&self, name: &str) -> Result<&StreamDefinition> {
        self.get(name).ok_or_else(|| Error::StreamNotFound {
            stream: name.to_string(),
        })
    }

    /// All definitions, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &StreamDefinition> {
        self.streams.iter()
    }

    /// All stream names, in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Streams without a parent, in declaration order
    pub fn roots(&self) -> Vec<&StreamDefinition> {
        self.streams.iter().filter(|s| s.is_root()).collect()
    }

    /// Direct children of `name`, in declaration order
    pub fn children(&self, name: &str) -> Vec<&StreamDefinition> {
        self.streams
            .iter()
            .filter(|s| s.parent.as_deref() == Some(name))
            .collect()
    }

    /// Whether `name` or any of its descendants satisfies `predicate`
    pub fn subtree_any<F>(&self, name: &str, predicate: &F) -> bool
    where
        F: Fn(&StreamDefinition) -> bool,
    {
        let Some(stream) = self.get(name) else {
            return false;
        };
        predicate(stream)
            || self
                .children(name)
                .into_iter()
                .any(|child| self.subtree_any(&child.name, predicate))
    }
}
