//! End-to-end crawl pipeline tests

use crate::support::{mount_html, mount_robots, test_config};
use std::time::{Duration, Instant};
use sumi_index::config::Config;
use sumi_index::storage::{CrawlStatus, SqliteStorage, Storage};
use sumi_index::{Crawler, Engine, ErrorKind};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_in(dir: &TempDir) -> Engine {
    let config = test_config(&dir.path().join("sites.db"), "auto");
    Engine::new(config).expect("engine should open")
}

#[tokio::test]
async fn test_full_crawl_stores_page() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private").await;
    mount_html(
        &server,
        "/guide",
        r#"<!DOCTYPE html><html><head>
            <title>Field Guide</title>
            <meta name="keywords" content="birds, owls">
            <meta name="description" content="Owls of the north">
            <style>p { margin: 0 }</style>
            </head><body><h1>Owls</h1><p>Snowy owls hunt by day.</p>
            <script>track();</script></body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let url = format!("{}/guide", server.uri());

    let page = engine.submit(&url).await.unwrap();
    assert_eq!(page.title, "Field Guide");
    assert_eq!(page.keywords, "birds, owls");
    assert_eq!(page.description, "Owls of the north");
    assert_eq!(page.snippet, "Field Guide Owls Snowy owls hunt by day.");

    let stored = engine.get(&url).unwrap().unwrap();
    assert_eq!(stored, page);
}

#[tokio::test]
async fn test_robots_disallow_private_allows_public() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private").await;
    mount_html(&server, "/public/x", "<title>Public</title>").await;
    Mock::given(method("GET"))
        .and(path("/private/x"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let err = engine
        .submit(&format!("{}/private/x", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::RobotsDisallowed));

    let page = engine
        .submit(&format!("{}/public/x", server.uri()))
        .await
        .unwrap();
    assert_eq!(page.title, "Public");
}

#[tokio::test]
async fn test_crawl_delay_takes_maximum_and_is_capped() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "User-agent: *\nCrawl-delay: 2\n\nUser-agent: TestBot\nCrawl-delay: 5\n",
    )
    .await;
    mount_html(&server, "/", "<title>Delayed</title>").await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir.path().join("sites.db"), "auto");
    let crawler = Crawler::new(&config).unwrap();

    let root = Url::parse(&server.uri()).unwrap();
    let policy = crawler.robots().policy_for_url(&root).await;
    assert_eq!(policy.crawl_delay_secs, 5.0);

    // Cap is 0.5s in the test config
    let started = Instant::now();
    crawler.crawl(&server.uri()).await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_secs(2));
}

#[tokio::test]
async fn test_image_content_type_rejected() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    // No media extension, so only the Content-Type gives it away
    Mock::given(method("GET"))
        .and(path("/avatar"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89u8, b'P', b'N', b'G'], "image/png"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let err = engine
        .submit(&format!("{}/avatar", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::UnsupportedContentType));
    assert_eq!(engine.stats().unwrap().total_pages, 0);
    assert_eq!(engine.logs(1).unwrap()[0].status, CrawlStatus::Error);
}

#[tokio::test]
async fn test_media_extension_skipped_without_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let err = engine
        .submit(&format!("{}/files/report.PDF", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::MediaSkipped));
}

#[tokio::test]
async fn test_invalid_scheme_performs_no_io() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    for scheme in ["ftp", "file", "gopher"] {
        let url = server.uri().replacen("http", scheme, 1);
        let err = engine.submit(&url).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidScheme), "{}", url);
    }
}

#[tokio::test]
async fn test_private_network_blocked_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.storage.database_path = dir.path().join("sites.db").display().to_string();
    let engine = Engine::new(config).unwrap();

    let port = Url::parse(&server.uri()).unwrap().port().unwrap();
    for host in ["127.0.0.1", "localhost", "[::1]"] {
        let err = engine
            .submit(&format!("http://{}:{}/", host, port))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::PrivateNetworkBlocked), "{}", host);
    }
}

#[tokio::test]
async fn test_recrawl_overwrites_single_record() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<title>Morning edition</title>", "text/html"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_html(&server, "/news", "<title>Evening edition</title>").await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let url = format!("{}/news", server.uri());

    assert_eq!(engine.submit(&url).await.unwrap().title, "Morning edition");
    assert_eq!(engine.submit(&url).await.unwrap().title, "Evening edition");

    assert_eq!(engine.stats().unwrap().total_pages, 1);
    assert_eq!(engine.get(&url).unwrap().unwrap().title, "Evening edition");
    assert!(engine.search("morning", None).unwrap().is_empty());
    assert_eq!(engine.search("evening", None).unwrap().len(), 1);
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let err = engine
        .submit(&format!("{}/down", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::HttpStatusError));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<title>Late</title>", "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir.path().join("sites.db"), "auto");
    config.crawler.fetch_timeout_secs = 1;
    let engine = Engine::new(config).unwrap();

    let err = engine
        .submit(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::FetchTimeout));
}

#[tokio::test]
async fn test_redirects_followed_and_checked() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    mount_html(&server, "/new", "<title>Moved here</title>").await;
    Mock::given(method("GET"))
        .and(path("/to-ftp"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "ftp://example.com/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/to-image"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/banner.png"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let page = engine
        .submit(&format!("{}/old", server.uri()))
        .await
        .unwrap();
    assert_eq!(page.title, "Moved here");

    for target in ["/to-ftp", "/to-image"] {
        let err = engine
            .submit(&format!("{}{}", server.uri(), target))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::FetchTransportError), "{}", target);
    }
}

#[tokio::test]
async fn test_charset_from_header() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<title>Caf\xe9 cr\xe8me</title>".to_vec(),
            "text/html; charset=ISO-8859-1",
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let page = engine
        .submit(&format!("{}/latin1", server.uri()))
        .await
        .unwrap();
    assert_eq!(page.title, "Café crème");
}

#[tokio::test]
async fn test_oversized_body_is_truncated_not_rejected() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    let mut html = String::from("<title>Huge</title><p>");
    html.push_str(&"word ".repeat(100_000));
    html.push_str("needle</p>");
    mount_html(&server, "/huge", &html).await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let page = engine
        .submit(&format!("{}/huge", server.uri()))
        .await
        .unwrap();
    assert_eq!(page.title, "Huge");
    assert!(page.snippet.ends_with("..."));
    // The tail lies past the byte cap and was never read
    assert!(engine.search("needle", None).unwrap().is_empty());
}

#[tokio::test]
async fn test_robots_cached_across_crawls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow:"))
        .expect(1)
        .mount(&server)
        .await;
    mount_html(&server, "/a", "<title>A</title>").await;
    mount_html(&server, "/b", "<title>B</title>").await;

    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    engine.submit(&format!("{}/a", server.uri())).await.unwrap();
    engine.submit(&format!("{}/b", server.uri())).await.unwrap();
}

#[tokio::test]
async fn test_pages_persist_across_reopen() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    mount_html(&server, "/keep", "<title>Persistent</title>").await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sites.db");
    let url = format!("{}/keep", server.uri());

    {
        let engine = Engine::new(test_config(&db_path, "auto")).unwrap();
        engine.submit(&url).await.unwrap();
    }

    let storage = SqliteStorage::new(&db_path, sumi_index::config::IndexMode::Auto).unwrap();
    assert_eq!(storage.count_pages().unwrap(), 1);
    assert_eq!(storage.count_crawl_logs(CrawlStatus::Ok).unwrap(), 1);
}
