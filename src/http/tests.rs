//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthConfig;
use crate::error::Error;
use crate::types::BackoffType;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(uri: &str) -> HttpClientConfig {
    HttpClientConfig::builder()
        .base_url(uri)
        .no_rate_limit()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
        .build()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.max_retries, 5);
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_some());
    assert!(config.cache_responses);
    assert!(config.user_agent.starts_with("tap-readthedocs/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://readthedocs.org")
        .timeout(Duration::from_secs(60))
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .user_agent("test-agent/1.0")
        .no_cache()
        .build();

    assert_eq!(config.base_url, Some("https://readthedocs.org".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.backoff_type, BackoffType::Constant);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.user_agent, "test-agent/1.0");
    assert!(!config.cache_responses);
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("limit", "50")
        .query("offset", "0")
        .query("offset", "50");

    assert_eq!(config.query.get("limit"), Some(&"50".to_string()));
    assert_eq!(config.query.get("offset"), Some(&"50".to_string()));
    assert_eq!(config.query.len(), 2);
}

#[test]
fn test_calculate_backoff() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(100),
            Duration::from_millis(500),
        )
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(client.calculate_backoff(3), Duration::from_millis(500));
    assert_eq!(client.calculate_backoff(40), Duration::from_millis(500));
}

#[tokio::test]
async fn test_get_json_with_query_and_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/projects/"))
        .and(query_param("limit", "50"))
        .and(query_param("offset", "0"))
        .and(header("Authorization", "Token secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{"id": 1, "slug": "pip"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        HttpClient::with_auth(test_config(&server.uri()), AuthConfig::api_token("secret")).unwrap();
    let body = client
        .get_json_with_config(
            "/api/v3/projects/",
            RequestConfig::new().query("limit", "50").query("offset", "0"),
        )
        .await
        .unwrap();

    assert_eq!(body["results"][0]["slug"], "pip");
    assert_eq!(client.requests_sent(), 1);
}

#[tokio::test]
async fn test_retries_after_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/projects/"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/projects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let client = HttpClient::with_config(test_config(&server.uri())).unwrap();
    let body = client.get_json_with_config("/api/v3/projects/", RequestConfig::new()).await.unwrap();

    assert_eq!(body, json!({"results": []}));
    assert_eq!(client.requests_sent(), 3);
}

#[tokio::test]
async fn test_rate_limit_exhausts_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let config = HttpClientConfig {
        max_retries: 1,
        ..test_config(&server.uri())
    };
    let client = HttpClient::with_config(config).unwrap();
    let err = client.get_json_with_config("/api/v3/projects/", RequestConfig::new()).await.unwrap_err();

    assert!(matches!(err, Error::RateLimited { .. }));
    assert_eq!(client.requests_sent(), 2);
}

#[tokio::test]
async fn test_retries_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = HttpClient::with_config(test_config(&server.uri())).unwrap();
    let body = client.get_json_with_config("/anything", RequestConfig::new()).await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found."))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::with_config(test_config(&server.uri())).unwrap();
    let err = client.get_json_with_config("/api/v3/projects/nope/", RequestConfig::new()).await.unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "Not found.");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = HttpClient::with_config(test_config(&server.uri())).unwrap();
    let err = client.get_json_with_config("/api/v3/projects/", RequestConfig::new()).await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_response_cache_serves_repeated_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/projects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [1]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::with_config(test_config(&server.uri())).unwrap();
    assert!(client.has_cache());

    let req = RequestConfig::new().query("offset", "0");
    let first = client
        .get_json_with_config("/api/v3/projects/", req.clone())
        .await
        .unwrap();
    let second = client
        .get_json_with_config("/api/v3/projects/", req)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(client.requests_sent(), 1);
}

#[tokio::test]
async fn test_cache_disabled_hits_server_each_time() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(2)
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .no_rate_limit()
        .no_cache()
        .build();
    let client = HttpClient::with_config(config).unwrap();
    assert!(!client.has_cache());

    client.get_json_with_config("/x", RequestConfig::new()).await.unwrap();
    client.get_json_with_config("/x", RequestConfig::new()).await.unwrap();
    assert_eq!(client.requests_sent(), 2);
}
