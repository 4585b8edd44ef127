//! Stream definition type

use crate::error::Result;
use crate::schema::Schema;
use crate::types::{Context, Record};

/// Record post-processing hook.
///
/// `Ok(None)` drops the record; an error aborts the run.
pub type PostProcessFn = fn(Record) -> Result<Option<Record>>;

/// Derives the context handed to child streams from one parent record
pub type ChildContextFn = fn(&Record) -> Option<Context>;

/// Immutable descriptor of one stream
#[derive(Debug, Clone)]
pub struct StreamDefinition {
    /// Unique stream name
    pub name: String,
    /// Path template, e.g. `/api/v3/projects/{project_slug}/builds`
    pub path: String,
    /// Fields forming the record's unique key, in order
    pub primary_keys: Vec<String>,
    /// Declared record schema
    pub schema: Schema,
    /// Name of the parent stream
    pub parent: Option<String>,
    /// Record post-processing; identity when absent
    pub post_process: Option<PostProcessFn>,
    /// Child context derivation; streams without it have no children
    pub derive_child_context: Option<ChildContextFn>,
}

impl StreamDefinition {
    /// Create a root stream definition
    pub fn new(name: impl Into<String>, path: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            primary_keys: Vec::new(),
            schema,
            parent: None,
            post_process: None,
            derive_child_context: None,
        }
    }

    /// Set the primary key fields
    #[must_use]
    pub fn primary_keys(mut self, keys: &[&str]) -> Self {
        self.primary_keys = keys.iter().map(ToString::to_string).collect();
        self
    }

    /// Declare the parent stream
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the post-processing hook
    #[must_use]
    pub fn post_process(mut self, hook: PostProcessFn) -> Self {
        self.post_process = Some(hook);
        self
    }

    /// Set the child context hook
    #[must_use]
    pub fn child_context(mut self, hook: ChildContextFn) -> Self {
        self.derive_child_context = Some(hook);
        self
    }

    /// Whether this stream has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Apply the post-processing hook (identity when none is set)
    pub fn apply_post_process(&self, record: Record) -> Result<Option<Record>> {
        match self.post_process {
            Some(hook) => hook(record),
            None => Ok(Some(record)),
        }
    }

    /// Derive the context for child streams from one of this stream's records
    pub fn child_context_for(&self, record: &Record) -> Option<Context> {
        self.derive_child_context.and_then(|hook| hook(record))
    }
}
