//! Wiremock helpers for transport tests

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Respond to `{http_method} {route}` with `status` forever
pub async fn mock_status(server: &MockServer, http_method: &str, route: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// First `fail_count` requests return `fail_status`, later ones return 200 with `body`
pub async fn mock_flaky(
    server: &MockServer,
    route: &str,
    fail_status: u16,
    fail_count: u64,
    body: &str,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(fail_status))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Number of requests the server has seen
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

/// An address nothing listens on
pub fn refused_url() -> String {
    "http://127.0.0.1:1/unreachable".to_string()
}
