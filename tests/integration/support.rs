//! Shared fixtures for the integration tests

use std::path::Path;
use sumi_index::config::{parse_config, Config};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a validated configuration the way a user would write it
///
/// Private-network protection is off so the loopback mock server can be
/// crawled, and the politeness cap is short.
pub fn test_config(db_path: &Path, index_mode: &str) -> Config {
    let toml = format!(
        r#"
[crawler]
block-private-networks = false
max-crawl-delay-secs = 0.5
fetch-timeout-secs = 5

[robots]
fetch-timeout-secs = 2

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"

[storage]
database-path = "{}"
full-text-index = "{}"
"#,
        db_path.display(),
        index_mode
    );
    parse_config(&toml).expect("test config should be valid")
}

pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_html(server: &MockServer, page_path: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}
