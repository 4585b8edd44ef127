//! Read the Docs API v3 streams
//!
//! `projects` and `organizations` are root streams. Every other stream hangs
//! off `projects` and is requested once per project slug.

use super::definition::StreamDefinition;
use crate::error::{Error, Result};
use crate::schema::{Property, PropertyType, Schema};
use crate::types::{Context, JsonValue, Record};
use serde_json::Map;

/// Streams only available to Read the Docs for Business accounts
pub const BUSINESS_STREAMS: &[&str] = &["organizations"];

/// Definitions active for a run, in discovery order
pub fn discover_streams(include_business_streams: bool) -> Vec<StreamDefinition> {
    let mut result = vec![
        builds(),
        projects(),
        redirects(),
        subprojects(),
        translations(),
        versions(),
    ];

    if include_business_streams {
        result.push(organizations());
    }

    result
}

fn prop(name: &str, property_type: PropertyType) -> Property {
    Property::new(name, property_type)
}

fn code_and_name(additional_properties: bool) -> PropertyType {
    let properties = vec![
        prop("code", PropertyType::String),
        prop("name", PropertyType::String),
    ];
    if additional_properties {
        PropertyType::open_object(properties)
    } else {
        PropertyType::object(properties)
    }
}

fn usernames() -> PropertyType {
    PropertyType::array(PropertyType::object(vec![prop(
        "username",
        PropertyType::String,
    )]))
}

/// `projects`: every project the token can see
pub fn projects() -> StreamDefinition {
    let schema = Schema::new(vec![
        prop("id", PropertyType::Integer),
        prop("name", PropertyType::String),
        prop("slug", PropertyType::String),
        prop("created", PropertyType::DateTime),
        prop("modified", PropertyType::DateTime),
        prop("language", code_and_name(true)),
        prop("programming_language", code_and_name(true)),
        prop(
            "repository",
            PropertyType::open_object(vec![
                prop("url", PropertyType::String),
                prop("type", PropertyType::String),
            ]),
        ),
        prop("default_version", PropertyType::String),
        prop("default_branch", PropertyType::String),
        prop("subproject_of", PropertyType::Integer),
        prop("translation_of", PropertyType::Integer),
        prop(
            "urls",
            PropertyType::open_object(vec![
                prop("documentation", PropertyType::String),
                prop("home", PropertyType::String),
                prop("builds", PropertyType::String),
                prop("versions", PropertyType::String),
                prop("downloads", PropertyType::String),
            ]),
        ),
        prop("tags", PropertyType::array(PropertyType::String)),
        prop("users", usernames()),
        prop("active_versions", PropertyType::any_object()),
        prop("homepage", PropertyType::String),
        prop("external_builds_privacy_level", PropertyType::String),
        prop("privacy_level", PropertyType::String),
        prop("single_version", PropertyType::Boolean),
        prop("versioning_scheme", PropertyType::String),
        prop("_links", PropertyType::open_object(Vec::new())),
    ]);

    StreamDefinition::new("projects", "/api/v3/projects/", schema)
        .primary_keys(&["id"])
        .child_context(project_context)
}

/// Child context of a project: its slug
pub fn project_context(record: &Record) -> Option<Context> {
    record
        .get("slug")
        .and_then(JsonValue::as_str)
        .map(|slug| Context::new().with_value("project_slug", slug))
}

/// `versions` of each project
pub fn versions() -> StreamDefinition {
    let schema = Schema::new(vec![
        prop("id", PropertyType::Integer),
        prop("project_slug", PropertyType::String),
        prop("slug", PropertyType::String),
        prop("verbose_name", PropertyType::String),
        prop("identifier", PropertyType::String),
        prop("ref", PropertyType::String),
        prop("built", PropertyType::Boolean),
        prop("active", PropertyType::Boolean),
        prop("hidden", PropertyType::Boolean),
        prop("type", PropertyType::String),
        prop("last_build", PropertyType::Integer),
        prop("downloads", PropertyType::any_object()),
        prop("urls", PropertyType::any_object()),
    ]);

    StreamDefinition::new("versions", "/api/v3/projects/{project_slug}/versions", schema)
        .primary_keys(&["id"])
        .parent("projects")
}

/// `builds` of each project
pub fn builds() -> StreamDefinition {
    let install = PropertyType::array(PropertyType::object(vec![
        prop("requirements", PropertyType::String),
        prop("method", PropertyType::String),
        prop("path", PropertyType::String),
        prop(
            "extra_requirements",
            PropertyType::array(PropertyType::String),
        ),
    ]));

    let schema = Schema::new(vec![
        prop("id", PropertyType::Integer),
        prop("project_slug", PropertyType::String),
        prop("version", PropertyType::String),
        prop("project", PropertyType::String),
        prop("created", PropertyType::DateTime),
        prop("finished", PropertyType::DateTime),
        prop("duration", PropertyType::Integer),
        prop("state", code_and_name(false)),
        prop("success", PropertyType::Boolean),
        prop("error", PropertyType::String),
        prop("commit", PropertyType::String),
        prop("urls", PropertyType::any_object()),
        prop(
            "config",
            PropertyType::object(vec![
                prop("version", PropertyType::String),
                prop("formats", PropertyType::array(PropertyType::String)),
                // TODO: declare the sphinx/mkdocs/build sections of the build config
                prop(
                    "python",
                    PropertyType::object(vec![
                        prop("version", PropertyType::String),
                        prop("install", install),
                        prop("system_packages", PropertyType::Boolean),
                    ]),
                ),
            ]),
        ),
    ]);

    StreamDefinition::new("builds", "/api/v3/projects/{project_slug}/builds", schema)
        .primary_keys(&["id"])
        .parent("projects")
        .post_process(normalize_build_config)
}

/// Coerce `config.python.version` to a string.
///
/// The API returns the Python version as a number for some builds and as a
/// string for others. Records whose `config` is empty pass through untouched;
/// a missing version becomes `""`.
pub fn normalize_build_config(mut record: Record) -> Result<Option<Record>> {
    if !record.get("config").is_some_and(is_truthy) {
        return Ok(Some(record));
    }

    let Some(JsonValue::Object(config)) = record.get_mut("config") else {
        return Err(Error::post_process("builds", "`config` is not an object"));
    };

    let python = config
        .entry("python")
        .or_insert_with(|| JsonValue::Object(Map::new()));
    let JsonValue::Object(python) = python else {
        return Err(Error::post_process(
            "builds",
            "`config.python` is not an object",
        ));
    };

    let version = python.get("version").map_or_else(String::new, display_value);
    python.insert("version".to_string(), JsonValue::String(version));

    Ok(Some(record))
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => "None".to_string(),
        JsonValue::Bool(true) => "True".to_string(),
        JsonValue::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

fn id_only_schema() -> Schema {
    // TODO: declare the remaining fields once the API reference documents them
    Schema::new(vec![prop("id", PropertyType::String)])
}

/// `subprojects` of each project
pub fn subprojects() -> StreamDefinition {
    StreamDefinition::new(
        "subprojects",
        "/api/v3/projects/{project_slug}/subprojects",
        id_only_schema(),
    )
    .primary_keys(&["id"])
    .parent("projects")
}

/// `translations` of each project
pub fn translations() -> StreamDefinition {
    StreamDefinition::new(
        "translations",
        "/api/v3/projects/{project_slug}/translations",
        id_only_schema(),
    )
    .primary_keys(&["id"])
    .parent("projects")
}

/// `redirects` configured on each project
pub fn redirects() -> StreamDefinition {
    let schema = Schema::new(vec![
        prop("id", PropertyType::String),
        prop("redirect_type", PropertyType::String),
        prop("from_url", PropertyType::String)
            .description("Absolute path, excluding the domain")
            .examples(["/docs/", "/install.html"]),
        prop("to_url", PropertyType::String)
            .description("Absolute or relative URL")
            .examples(["/tutorial/install.html"]),
        prop("force", PropertyType::Boolean)
            .description("Apply the redirect even if the page exists"),
        prop("http_status", PropertyType::Integer).description("HTTP status code for the redirect"),
        prop("enabled", PropertyType::Boolean),
        prop("description", PropertyType::String),
        prop("position", PropertyType::Integer).description("Order of execution of the redirect"),
        prop("create_dt", PropertyType::DateTime),
        prop("update_dt", PropertyType::DateTime),
    ]);

    StreamDefinition::new(
        "redirects",
        "/api/v3/projects/{project_slug}/redirects",
        schema,
    )
    .primary_keys(&["id"])
    .parent("projects")
}

/// `organizations` (Read the Docs for Business only)
pub fn organizations() -> StreamDefinition {
    let schema = Schema::new(vec![
        prop("slug", PropertyType::String),
        prop("name", PropertyType::String),
        prop("url", PropertyType::String),
        prop("email", PropertyType::String),
        prop("description", PropertyType::String),
        prop("created", PropertyType::DateTime),
        prop("modified", PropertyType::DateTime),
        prop("disabled", PropertyType::Boolean),
        prop("owners", usernames()),
    ]);

    StreamDefinition::new("organizations", "/api/v3/organizations/", schema).primary_keys(&["slug"])
}
