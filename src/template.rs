//! Path template interpolation
//!
//! Stream paths reference parent-supplied values with single braces, e.g.
//! `/api/v3/projects/{project_slug}/versions`. Values come from the
//! [`Context`] a parent record derived for the child stream.

use crate::error::{Error, Result};
use crate::types::{Context, JsonValue};
use regex::Regex;
use std::sync::LazyLock;

/// Regex for matching template variables: {variable}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}").expect("template regex is valid")
});

/// Names of the variables referenced by a template, in order of appearance
pub fn variables(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let name = cap[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: Option<&Context>) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let name = &cap[1];
        match ctx.and_then(|c| c.get(name)) {
            Some(value) => value_to_string(value),
            None => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Convert a JSON value to its path representation
fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
