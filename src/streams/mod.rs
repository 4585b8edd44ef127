//! Stream definitions
//!
//! # Overview
//!
//! A stream is one resource type of the Read the Docs API. Each
//! [`StreamDefinition`] is plain data: a name, a path template, a primary key,
//! a schema, an optional parent and two optional hooks (record
//! post-processing and child-context derivation). The [`StreamRegistry`]
//! holds the active definitions, resolves parent references by name and
//! rejects graphs that are not a forest.

mod definition;
mod readthedocs;
mod registry;

pub use definition::{ChildContextFn, PostProcessFn, StreamDefinition};
pub use readthedocs::{
    builds, discover_streams, normalize_build_config, organizations, project_context, projects,
    redirects, subprojects, translations, versions, BUSINESS_STREAMS,
};
pub use registry::StreamRegistry;
