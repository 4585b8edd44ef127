//! Tests for engine module

use super::*;
use crate::config::TapConfig;
use crate::decode::JsonDecoder;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::output::{MemorySink, Message};
use crate::pagination::OffsetPaginator;
use crate::streams::{projects, versions};
use crate::types::{BackoffType, Context, StringMap};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_config() -> HttpClientConfig {
    HttpClientConfig::builder()
        .no_rate_limit()
        .max_retries(1)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
        .build()
}

fn tap(server: &MockServer) -> Tap {
    let config = TapConfig::new("secret").with_api_url(server.uri());
    Tap::with_client_config(config, http_config()).unwrap()
}

fn page(results: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "count": results.as_array().map_or(0, Vec::len),
        "next": null,
        "previous": null,
        "results": results
    }))
}

async fn mount_page(server: &MockServer, resource: &str, offset: u64, results: Value) {
    Mock::given(method("GET"))
        .and(path(resource))
        .and(query_param("offset", offset.to_string()))
        .respond_with(page(results))
        .expect(1)
        .mount(server)
        .await;
}

fn ids(sink: &MemorySink, stream: &str) -> Vec<Value> {
    sink.records(stream).iter().map(|r| r["id"].clone()).collect()
}

// ============================================================================
// SyncStats Tests
// ============================================================================

#[test]
fn test_sync_stats_counters() {
    let mut stats = SyncStats::new();
    stats.add_record("projects");
    stats.add_record("projects");
    stats.add_record("versions");
    stats.add_page();
    stats.add_duplicate();
    stats.add_missing_key();

    assert_eq!(stats.records_for("projects"), 2);
    assert_eq!(stats.records_for("builds"), 0);
    assert_eq!(stats.total_records(), 3);
    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(stats.missing_keys_skipped, 1);
}

// ============================================================================
// Executor Tests
// ============================================================================

#[tokio::test]
async fn test_reader_sends_page_params_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/projects/"))
        .and(query_param("limit", "50"))
        .and(query_param("offset", "0"))
        .and(query_param("expand", "config"))
        .and(header("Authorization", "Token secret"))
        .respond_with(page(json!([{"id": 1, "slug": "pip"}])))
        .expect(1)
        .mount(&server)
        .await;

    let tap = tap(&server);
    let mut sink = MemorySink::new();
    tap.with_selection(["projects"])
        .unwrap()
        .run(&mut sink)
        .await
        .unwrap();

    assert_eq!(ids(&sink, "projects"), vec![json!(1)]);
}

#[tokio::test]
async fn test_reader_renders_path_and_merges_context() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/api/v3/projects/pip/versions",
        0,
        json!([{"id": 10, "slug": "latest", "unknown": true}]),
    )
    .await;

    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .no_rate_limit()
            .build(),
    )
    .unwrap();
    let paginator = OffsetPaginator::default();
    let decoder = JsonDecoder::new();
    let params = StringMap::new();
    let executor = StreamExecutor::new(&client, &paginator, &decoder, &params);

    let stream = versions();
    let context = Context::new().with_value("project_slug", "pip");
    let mut reader = executor.reader(&stream, Some(context)).unwrap();
    assert_eq!(reader.path(), "/api/v3/projects/pip/versions");

    let records = reader.next_page().await.unwrap().unwrap();
    assert_eq!(
        Value::Object(records[0].clone()),
        json!({"id": 10, "slug": "latest", "project_slug": "pip"})
    );

    // Short page: the sweep is over without another request
    assert!(reader.next_page().await.unwrap().is_none());
    assert!(reader.state().done);
}

#[tokio::test]
async fn test_reader_requires_context_for_templated_path() {
    let server = MockServer::start().await;
    let client = HttpClient::with_config(HttpClientConfig::builder().base_url(server.uri()).build())
        .unwrap();
    let paginator = OffsetPaginator::default();
    let decoder = JsonDecoder::new();
    let params = StringMap::new();
    let executor = StreamExecutor::new(&client, &paginator, &decoder, &params);

    let stream = versions();
    assert!(matches!(
        executor.reader(&stream, None),
        Err(Error::UndefinedVariable { .. })
    ));

    let stream = projects();
    assert!(executor.reader(&stream, None).is_ok());
}

// ============================================================================
// Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_pagination_stops_on_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/api/v3/projects/", 0, json!([{"id": 1}, {"id": 2}])).await;
    mount_page(&server, "/api/v3/projects/", 2, json!([{"id": 3}, {"id": 4}])).await;
    mount_page(&server, "/api/v3/projects/", 4, json!([{"id": 5}])).await;

    let tap = tap(&server)
        .with_paginator(OffsetPaginator::new(0, 2))
        .with_selection(["projects"])
        .unwrap();
    let mut sink = MemorySink::new();
    let stats = tap.run(&mut sink).await.unwrap();

    assert_eq!(
        ids(&sink, "projects"),
        vec![json!(1), json!(2), json!(3), json!(4), json!(5)]
    );
    assert_eq!(stats.pages_fetched, 3);
    assert_eq!(stats.requests_sent, 3);
}

#[tokio::test]
async fn test_pagination_full_last_page_needs_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/api/v3/projects/", 0, json!([{"id": 1}, {"id": 2}])).await;
    mount_page(&server, "/api/v3/projects/", 2, json!([])).await;

    let tap = tap(&server)
        .with_paginator(OffsetPaginator::new(0, 2))
        .with_selection(["projects"])
        .unwrap();
    let mut sink = MemorySink::new();
    let stats = tap.run(&mut sink).await.unwrap();

    assert_eq!(stats.records_for("projects"), 2);
    assert_eq!(stats.requests_sent, 2);
}

// ============================================================================
// Orchestrator Tests
// ============================================================================

#[tokio::test]
async fn test_children_follow_their_parent() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/api/v3/projects/",
        0,
        json!([{"id": 1, "slug": "p1"}, {"id": 2, "slug": "p2"}]),
    )
    .await;
    mount_page(
        &server,
        "/api/v3/projects/p1/versions",
        0,
        json!([{"id": 11}, {"id": 12}]),
    )
    .await;
    mount_page(&server, "/api/v3/projects/p2/versions", 0, json!([{"id": 21}])).await;

    let tap = tap(&server)
        .with_selection(["projects", "versions"])
        .unwrap();
    let mut sink = MemorySink::new();
    tap.run(&mut sink).await.unwrap();

    assert_eq!(
        sink.record_streams(),
        vec!["projects", "versions", "versions", "projects", "versions"]
    );
    assert_eq!(ids(&sink, "versions"), vec![json!(11), json!(12), json!(21)]);
    let slugs: Vec<_> = sink
        .records("versions")
        .iter()
        .map(|r| r["project_slug"].clone())
        .collect();
    assert_eq!(slugs, vec![json!("p1"), json!("p1"), json!("p2")]);
}

#[tokio::test]
async fn test_children_run_in_declaration_order() {
    let server = MockServer::start().await;
    mount_page(&server, "/api/v3/projects/", 0, json!([{"id": 1, "slug": "p1"}])).await;
    mount_page(&server, "/api/v3/projects/p1/builds", 0, json!([{"id": 100}])).await;
    mount_page(&server, "/api/v3/projects/p1/versions", 0, json!([{"id": 200}])).await;

    let tap = tap(&server)
        .with_selection(["projects", "versions", "builds"])
        .unwrap();
    let mut sink = MemorySink::new();
    tap.run(&mut sink).await.unwrap();

    assert_eq!(sink.record_streams(), vec!["projects", "builds", "versions"]);
}

#[tokio::test]
async fn test_schema_emitted_once_before_records() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/api/v3/projects/",
        0,
        json!([{"id": 1, "slug": "p1"}, {"id": 2, "slug": "p2"}]),
    )
    .await;
    mount_page(&server, "/api/v3/projects/p1/versions", 0, json!([{"id": 11}])).await;
    mount_page(&server, "/api/v3/projects/p2/versions", 0, json!([{"id": 21}])).await;

    let tap = tap(&server)
        .with_selection(["projects", "versions"])
        .unwrap();
    let mut sink = MemorySink::new();
    tap.run(&mut sink).await.unwrap();

    assert_eq!(sink.schema_streams(), vec!["projects", "versions"]);
    for stream in ["projects", "versions"] {
        let schema_at = sink
            .messages()
            .iter()
            .position(|m| m.is_schema() && m.stream() == Some(stream))
            .unwrap();
        let first_record = sink
            .messages()
            .iter()
            .position(|m| m.is_record() && m.stream() == Some(stream))
            .unwrap();
        assert!(schema_at < first_record);
    }

    let last = sink.messages().last().unwrap();
    assert_eq!(last, &Message::empty_state());
}

#[tokio::test]
async fn test_unselected_parent_is_swept_silently() {
    let server = MockServer::start().await;
    mount_page(&server, "/api/v3/projects/", 0, json!([{"id": 1, "slug": "p1"}])).await;
    mount_page(&server, "/api/v3/projects/p1/versions", 0, json!([{"id": 11}])).await;

    let tap = tap(&server).with_selection(["versions"]).unwrap();
    let mut sink = MemorySink::new();
    let stats = tap.run(&mut sink).await.unwrap();

    assert_eq!(sink.schema_streams(), vec!["versions"]);
    assert_eq!(sink.record_streams(), vec!["versions"]);
    assert_eq!(stats.records_for("projects"), 0);
}

#[tokio::test]
async fn test_unknown_selection_rejected() {
    let server = MockServer::start().await;
    let result = tap(&server).with_selection(["organizations"]);
    assert!(matches!(result, Err(Error::StreamNotFound { .. })));
}

#[tokio::test]
async fn test_root_404_aborts_without_children() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/projects/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found."))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/projects/p1/versions"))
        .respond_with(page(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let tap = tap(&server)
        .with_selection(["projects", "versions"])
        .unwrap();
    let mut sink = MemorySink::new();
    let err = tap.run(&mut sink).await.unwrap_err();

    match err {
        Error::Request { path, status, .. } => {
            assert_eq!(path, "/api/v3/projects/");
            assert_eq!(status, 404);
        }
        other => panic!("Expected Request error, got {other:?}"),
    }
    assert!(sink.record_streams().is_empty());
    assert!(!sink.messages().iter().any(Message::is_state));
}

#[tokio::test]
async fn test_child_error_names_rendered_path() {
    let server = MockServer::start().await;
    mount_page(&server, "/api/v3/projects/", 0, json!([{"id": 1, "slug": "p1"}])).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/projects/p1/versions"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let tap = tap(&server)
        .with_selection(["projects", "versions"])
        .unwrap();
    let mut sink = MemorySink::new();
    let err = tap.run(&mut sink).await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert!(err.to_string().contains("/api/v3/projects/p1/versions"));
    // The parent record was emitted before its children failed
    assert_eq!(sink.record_streams(), vec!["projects"]);
}

#[tokio::test]
async fn test_missing_slug_skips_children() {
    let server = MockServer::start().await;
    mount_page(&server, "/api/v3/projects/", 0, json!([{"id": 1}])).await;

    let tap = tap(&server)
        .with_selection(["projects", "versions"])
        .unwrap();
    let mut sink = MemorySink::new();
    let stats = tap.run(&mut sink).await.unwrap();

    assert_eq!(sink.record_streams(), vec!["projects"]);
    assert_eq!(stats.contexts_skipped, 1);
}

#[tokio::test]
async fn test_duplicate_primary_key_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/api/v3/projects/",
        0,
        json!([{"id": 1, "slug": "a"}, {"id": 1, "slug": "a"}, {"id": 2, "slug": "b"}]),
    )
    .await;

    let tap = tap(&server).with_selection(["projects"]).unwrap();
    let mut sink = MemorySink::new();
    let stats = tap.run(&mut sink).await.unwrap();

    assert_eq!(ids(&sink, "projects"), vec![json!(1), json!(2)]);
    assert_eq!(stats.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_missing_primary_key_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/api/v3/projects/",
        0,
        json!([{"id": null, "slug": "a"}, {"id": 2, "slug": "b"}]),
    )
    .await;
    // The keyless project is skipped, so its children are never swept
    Mock::given(method("GET"))
        .and(path("/api/v3/projects/a/versions"))
        .respond_with(page(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/api/v3/projects/b/versions", 0, json!([{"id": 21}])).await;

    let tap = tap(&server)
        .with_selection(["projects", "versions"])
        .unwrap();
    let mut sink = MemorySink::new();
    let stats = tap.run(&mut sink).await.unwrap();

    assert_eq!(ids(&sink, "projects"), vec![json!(2)]);
    assert_eq!(ids(&sink, "versions"), vec![json!(21)]);
    assert_eq!(stats.missing_keys_skipped, 1);
    assert_eq!(stats.contexts_skipped, 0);
}

#[tokio::test]
async fn test_child_without_id_does_not_stop_the_run() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/api/v3/projects/",
        0,
        json!([{"id": 1, "slug": "p1"}, {"id": 2, "slug": "p2"}]),
    )
    .await;
    mount_page(
        &server,
        "/api/v3/projects/p1/subprojects",
        0,
        json!([{"child": {"id": 9, "slug": "sub"}, "alias": "sub"}]),
    )
    .await;
    mount_page(&server, "/api/v3/projects/p2/subprojects", 0, json!([{"id": 5}])).await;

    let tap = tap(&server)
        .with_selection(["projects", "subprojects"])
        .unwrap();
    let mut sink = MemorySink::new();
    let stats = tap.run(&mut sink).await.unwrap();

    assert_eq!(ids(&sink, "projects"), vec![json!(1), json!(2)]);
    assert_eq!(ids(&sink, "subprojects"), vec![json!(5)]);
    assert_eq!(stats.missing_keys_skipped, 1);
    assert!(sink.messages().last().unwrap().is_state());
}

#[tokio::test]
async fn test_duplicate_parent_does_not_sweep_children() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/api/v3/projects/",
        0,
        json!([{"id": 1, "slug": "p1"}, {"id": 1, "slug": "renamed"}]),
    )
    .await;
    mount_page(&server, "/api/v3/projects/p1/versions", 0, json!([{"id": 11}])).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/projects/renamed/versions"))
        .respond_with(page(json!([{"id": 99}])))
        .expect(0)
        .mount(&server)
        .await;

    let tap = tap(&server)
        .with_selection(["projects", "versions"])
        .unwrap();
    let mut sink = MemorySink::new();
    let stats = tap.run(&mut sink).await.unwrap();

    assert_eq!(sink.record_streams(), vec!["projects", "versions"]);
    assert_eq!(ids(&sink, "versions"), vec![json!(11)]);
    assert_eq!(stats.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_builds_are_post_processed_and_projected() {
    let server = MockServer::start().await;
    mount_page(&server, "/api/v3/projects/", 0, json!([{"id": 1, "slug": "p1"}])).await;
    mount_page(
        &server,
        "/api/v3/projects/p1/builds",
        0,
        json!([{
            "id": 7,
            "success": true,
            "config": {"python": {"version": 3.8}, "sphinx": {"builder": "html"}},
            "_links": {}
        }]),
    )
    .await;

    let tap = tap(&server).with_selection(["builds"]).unwrap();
    let mut sink = MemorySink::new();
    tap.run(&mut sink).await.unwrap();

    let builds = sink.records("builds");
    assert_eq!(builds.len(), 1);
    assert_eq!(
        Value::Object(builds[0].clone()),
        json!({
            "id": 7,
            "success": true,
            "config": {"python": {"version": "3.8"}},
            "project_slug": "p1"
        })
    );
}

#[tokio::test]
async fn test_organizations_only_with_business_streams() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/api/v3/organizations/",
        0,
        json!([{"slug": "acme", "name": "Acme"}]),
    )
    .await;

    let plain = tap(&server);
    assert!(plain.registry().get("organizations").is_none());

    let config = TapConfig::new("secret")
        .with_api_url(server.uri())
        .with_business_streams(true);
    let business = Tap::with_client_config(config, http_config())
        .unwrap()
        .with_selection(["organizations"])
        .unwrap();
    let mut sink = MemorySink::new();
    business.run(&mut sink).await.unwrap();

    assert_eq!(sink.records("organizations")[0]["slug"], "acme");
}

#[tokio::test]
async fn test_check_requests_single_project() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/projects/"))
        .and(query_param("limit", "1"))
        .and(header("Authorization", "Token secret"))
        .respond_with(page(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    tap(&server).check().await.unwrap();
}

#[tokio::test]
async fn test_check_reports_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/projects/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token."))
        .mount(&server)
        .await;

    let err = tap(&server).check().await.unwrap_err();
    assert!(matches!(err, Error::Request { status: 401, .. }));
}
