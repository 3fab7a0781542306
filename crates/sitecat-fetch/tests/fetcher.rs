//! Integration tests for `HttpFetcher` using wiremock.
//!
//! The fetcher builds its URL from a scheme and a "domain"; pointing the
//! scheme at plain HTTP lets the mock server's `host:port` stand in for a
//! real domain.

use sitecat_core::RenderOptions;
use sitecat_fetch::{FetchError, HttpFetcher};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_fetcher() -> HttpFetcher {
    HttpFetcher::with_scheme(5, "sitecat-test/0.1", "http").expect("fetcher construction")
}

fn mock_domain(server: &MockServer) -> String {
    server
        .uri()
        .trim_start_matches("http://")
        .to_string()
}

#[tokio::test]
async fn fetch_returns_page_body_without_screenshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>hi</body></html>"))
        .mount(&server)
        .await;

    let page = test_fetcher()
        .fetch(&mock_domain(&server), &RenderOptions::default())
        .await
        .expect("fetch should succeed");

    assert_eq!(page.html, "<html><body>hi</body></html>");
    assert!(page.screenshot.is_none());
}

#[tokio::test]
async fn non_success_status_fails_after_both_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let err = test_fetcher()
        .fetch(&mock_domain(&server), &RenderOptions::default())
        .await
        .expect_err("fetch should fail");

    assert!(matches!(err, FetchError::Status { status: 503, .. }));
}

#[tokio::test]
async fn second_attempt_can_recover() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&server)
        .await;

    let page = test_fetcher()
        .fetch(&mock_domain(&server), &RenderOptions::default())
        .await
        .expect("second attempt should succeed");

    assert_eq!(page.html, "recovered");
}
