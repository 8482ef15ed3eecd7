//! Integration tests for TableFetcher using wiremock
//!
//! These tests validate the HTTP fetcher's behavior with mock servers.

use jepwatch::crawler::TableFetcher;
use jepwatch::error::FetchError;
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(server: &MockServer, max_retries: u32) -> TableFetcher {
    TableFetcher::with_url(
        &format!("{}/jeps/0", server.uri()),
        max_retries,
        Duration::from_secs(5),
    )
    .unwrap()
    .with_base_delay_ms(10)
}

/// Test successful fetch from mock server
#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;
    let html = r#"<!DOCTYPE html>
<html>
<head><title>JEP 0: JEP Index</title></head>
<body><table class="jeps"><tr><td>F</td></tr></table></body>
</html>"#;

    Mock::given(method("GET"))
        .and(path("/jeps/0"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server, 0).fetch_text().await;

    assert!(result.is_ok(), "Fetch should succeed: {:?}", result.err());
    assert!(result.unwrap().contains("JEP Index"));
}

/// Test that server errors trigger retries
#[tokio::test]
async fn test_server_error_retry() {
    let mock_server = MockServer::start().await;

    // Return 500 twice, then succeed
    Mock::given(method("GET"))
        .and(path("/jeps/0"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jeps/0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server, 2).fetch_text().await;

    assert_eq!(result.unwrap(), "OK");
}

/// Test 404 does not retry
#[tokio::test]
async fn test_404_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jeps/0"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1) // Should only be called once (no retry)
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server, 3).fetch_text().await;

    assert!(matches!(result, Err(FetchError::ServerError(404))));
}

/// Test max retries exceeded
#[tokio::test]
async fn test_max_retries_exceeded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jeps/0"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3) // Initial attempt + 2 retries
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server, 2).fetch_text().await;

    assert!(matches!(result, Err(FetchError::MaxRetriesExceeded)));
}

/// Test that persistent rate limiting is reported as such
#[tokio::test]
async fn test_rate_limit_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jeps/0"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server, 1).fetch_text().await;

    assert!(matches!(result, Err(FetchError::RateLimit)));
}

/// Test that slow responses time out and are retried
#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jeps/0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = TableFetcher::with_url(
        &format!("{}/jeps/0", mock_server.uri()),
        1,
        Duration::from_millis(200),
    )
    .unwrap()
    .with_base_delay_ms(10);

    let result = fetcher.fetch_text().await;

    assert!(matches!(result, Err(FetchError::MaxRetriesExceeded)));
}

/// Test that the Content-Type charset drives decoding
#[tokio::test]
async fn test_charset_from_header() {
    let mock_server = MockServer::start().await;

    // "Fran\u{e7}ois" in windows-1252
    let body: Vec<u8> = b"Fran\xe7ois".to_vec();
    Mock::given(method("GET"))
        .and(path("/jeps/0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html; charset=windows-1252"),
        )
        .mount(&mock_server)
        .await;

    let text = fetcher(&mock_server, 0).fetch_text().await.unwrap();
    assert_eq!(text, "François");
}

/// Test that the parsed document is available directly
#[tokio::test]
async fn test_fetch_document() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jeps/0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>JEP 0</title></head></html>"),
        )
        .mount(&mock_server)
        .await;

    let document = fetcher(&mock_server, 0).fetch_document().await.unwrap();
    let title = scraper::Selector::parse("title").unwrap();
    let text: String = document.select(&title).next().unwrap().text().collect();
    assert_eq!(text, "JEP 0");
}
