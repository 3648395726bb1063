//! Integration tests for the HTTP fetcher
//!
//! These tests run `HttpFetcher` against a wiremock server and check how
//! responses are classified.

use catalog_harvest::config::FetcherConfig;
use catalog_harvest::crawler::{build_http_client, FetchOutcome, Fetcher, HttpFetcher};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> FetcherConfig {
    FetcherConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        timeout_secs: 5,
    }
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_success_returns_bytes_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><title>Hello</title></html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&test_config()).unwrap();
    let outcome = fetcher
        .fetch(&format!("{}/item/1", server.uri()), None)
        .await;

    match outcome {
        FetchOutcome::Fetched(page) => {
            assert_eq!(page.status, 200);
            assert_eq!(page.bytes, b"<html><title>Hello</title></html>".to_vec());
            assert_eq!(
                page.content_type.as_deref(),
                Some("text/html; charset=utf-8")
            );
            assert!(page.final_url.ends_with("/item/1"));
        }
        other => panic!("expected a fetched page, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_and_gone_are_not_found() {
    let server = MockServer::start().await;
    mount_status(&server, "/missing", 404).await;
    mount_status(&server, "/gone", 410).await;

    let fetcher = HttpFetcher::new(&test_config()).unwrap();

    for route in ["/missing", "/gone"] {
        let outcome = fetcher
            .fetch(&format!("{}{}", server.uri(), route), None)
            .await;
        assert_eq!(outcome, FetchOutcome::NotFound, "route {}", route);
    }
}

#[tokio::test]
async fn test_server_errors_are_transient() {
    let server = MockServer::start().await;
    mount_status(&server, "/error", 500).await;
    mount_status(&server, "/busy", 503).await;
    mount_status(&server, "/forbidden", 403).await;

    let fetcher = HttpFetcher::new(&test_config()).unwrap();

    for (route, expected) in [("/error", 500), ("/busy", 503), ("/forbidden", 403)] {
        let outcome = fetcher
            .fetch(&format!("{}{}", server.uri(), route), None)
            .await;
        assert_eq!(
            outcome,
            FetchOutcome::Transient(format!("HTTP {}", expected))
        );
    }
}

#[tokio::test]
async fn test_slow_response_times_out_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = build_http_client(&test_config()).unwrap();
    let fetcher = HttpFetcher::with_client(client, Duration::from_millis(200));

    let started = std::time::Instant::now();
    let outcome = fetcher.fetch(&format!("{}/slow", server.uri()), None).await;

    assert!(matches!(outcome, FetchOutcome::Transient(_)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_consent_cookie_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gated"))
        .and(header("cookie", "age_check_done=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&test_config()).unwrap();
    let url = format!("{}/gated", server.uri());

    let with_cookie = fetcher.fetch(&url, Some("age_check_done=1")).await;
    assert!(with_cookie.is_fetched());

    // Unmatched requests fall through to wiremock's default 404
    let without_cookie = fetcher.fetch(&url, None).await;
    assert_eq!(without_cookie, FetchOutcome::NotFound);
}

#[tokio::test]
async fn test_user_agent_identifies_crawler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&test_config()).unwrap();
    let outcome = fetcher.fetch(&format!("{}/ua", server.uri()), None).await;

    assert!(outcome.is_fetched());
}
