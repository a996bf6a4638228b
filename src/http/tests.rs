//! Tests for the HTTP transport module

use super::*;
use crate::config::CanvasConfig;
use crate::progress::Progress;
use crate::types::Method;
use std::time::Duration;
use tempfile::tempdir;
use url::Url;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = CanvasConfig::builder()
        .base_url(server.uri())
        .token("secret-token")
        .no_quota()
        .build();
    HttpClient::new(&config).unwrap()
}

fn url(server: &MockServer, path_and_query: &str) -> Url {
    Url::parse(&format!("{}{path_and_query}", server.uri())).unwrap()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_requires_base_url() {
    let err = HttpClient::new(&CanvasConfig::default()).unwrap_err();
    assert!(matches!(err, crate::Error::MissingConfigField { .. }));
}

#[test]
fn test_new_rejects_bad_header() {
    let config = CanvasConfig::builder()
        .base_url("https://school.instructure.com")
        .header("bad header", "x")
        .build();
    let err = HttpClient::new(&config).unwrap_err();
    assert!(err.to_string().contains("invalid header name"));
}

#[test]
fn test_is_canvas_host() {
    let config = CanvasConfig::for_subdomain("school", "t");
    let client = HttpClient::new(&config).unwrap();

    let own = Url::parse("https://school.instructure.com/api/v1/courses?page=2").unwrap();
    let files = Url::parse("https://files.instructure.com/x").unwrap();
    assert!(client.is_canvas_host(&own));
    assert!(!client.is_canvas_host(&files));
    assert!(client.quota().is_some());
    assert!(!client.has_rate_limiter());
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_get_sends_accept_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .and(query_param("per_page", "10"))
        .and(header("accept", "application/json"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":1}]"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .execute(
            TransportRequest::get(url(&server, "/api/v1/courses?per_page=10")),
            &Progress::new(),
        )
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.body.as_ref(), br#"[{"id":1}]"#);
}

#[tokio::test]
async fn test_post_sends_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/courses/1/modules"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("module%5Bname%5D=Week+1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":9}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = TransportRequest::with_form(
        Method::POST,
        url(&server, "/api/v1/courses/1/modules"),
        "module%5Bname%5D=Week+1".to_string(),
    );
    let response = client.execute(request, &Progress::new()).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_error_status_is_returned_as_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-rate-limit-remaining", "0.0")
                .set_body_string("403 Forbidden (Rate Limit Exceeded)"),
        )
        .mount(&server)
        .await;

    let config = CanvasConfig::builder()
        .base_url(server.uri())
        .token("t")
        .build();
    let client = HttpClient::new(&config).unwrap();
    let response = client
        .execute(
            TransportRequest::get(url(&server, "/api/v1/courses")),
            &Progress::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 403);
    assert_eq!(response.header(RATE_LIMIT_REMAINING_HEADER), Some("0.0"));
    assert_eq!(client.quota().unwrap().last_reported(), Some(0.0));
}

#[tokio::test]
async fn test_out_of_range_quota_header_does_not_break_next_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-rate-limit-remaining", "-1e30")
                .set_body_string("[]"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = CanvasConfig::builder()
        .base_url(server.uri())
        .quota(QuotaConfig {
            regen_per_second: 1000.0,
            ..QuotaConfig::default()
        })
        .build();
    let client = HttpClient::new(&config).unwrap();
    let progress = Progress::new();

    for _ in 0..2 {
        let response = client
            .execute(TransportRequest::get(url(&server, "/api/v1/courses")), &progress)
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }
    assert_eq!(client.quota().unwrap().last_reported(), Some(0.0));
}

#[tokio::test]
async fn test_credentials_withheld_from_foreign_host() {
    let canvas = MockServer::start().await;
    let foreign = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&foreign)
        .await;

    let client = client_for(&canvas);
    client
        .execute(
            TransportRequest::get(url(&foreign, "/files/1/download")),
            &Progress::new(),
        )
        .await
        .unwrap();

    let requests = foreign.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/api/v1/new?page=1"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .execute(
            TransportRequest::get(url(&server, "/api/v1/old")),
            &Progress::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.url.path(), "/api/v1/new");
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = CanvasConfig::builder()
        .base_url(server.uri())
        .timeout(Duration::from_millis(100))
        .no_quota()
        .build();
    let client = HttpClient::new(&config).unwrap();
    let err = client
        .execute(
            TransportRequest::get(url(&server, "/api/v1/courses")),
            &Progress::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, crate::Error::Timeout { timeout_ms: 100 }));
    assert_eq!(err.kind(), crate::ErrorKind::Transport);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_send_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let progress = Progress::new();
    progress.cancel();

    let err = client
        .execute(
            TransportRequest::get(url(&server, "/api/v1/courses")),
            &progress,
        )
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let progress = Progress::new();
    let canceller = progress.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = client
        .execute(
            TransportRequest::get(url(&server, "/api/v1/courses")),
            &progress,
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

// ============================================================================
// Archive
// ============================================================================

#[tokio::test]
async fn test_archives_successful_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":1}]"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = CanvasConfig::builder()
        .base_url(server.uri())
        .archive_dir(dir.path())
        .no_quota()
        .build();
    let client = HttpClient::new(&config).unwrap();
    let progress = Progress::new();

    client
        .execute(
            TransportRequest::get(url(&server, "/api/v1/courses?page=2")),
            &progress,
        )
        .await
        .unwrap();
    client
        .execute(TransportRequest::get(url(&server, "/api/v1/missing")), &progress)
        .await
        .unwrap();

    let saved = dir.path().join("api/v1/courses.json/page%3D2.json");
    assert_eq!(std::fs::read_to_string(saved).unwrap(), r#"[{"id":1}]"#);
    assert!(!dir.path().join("api/v1/missing.json").exists());
}
