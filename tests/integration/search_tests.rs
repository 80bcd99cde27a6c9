//! Storage and search tier tests against file-backed databases

use crate::support::{mount_html, mount_robots, test_config};
use chrono::{Duration, Utc};
use sumi_index::config::IndexMode;
use sumi_index::search::{SearchEngine, SNIPPET_WEIGHT, TITLE_WEIGHT};
use sumi_index::storage::{IndexCapability, PageRecord, SqliteStorage, Storage};
use sumi_index::Engine;
use tempfile::TempDir;
use wiremock::MockServer;

const ALL_MODES: [IndexMode; 3] = [IndexMode::Auto, IndexMode::MatchOnly, IndexMode::Disabled];

fn record(url: &str, title: &str, snippet: &str) -> PageRecord {
    PageRecord {
        url: url.to_string(),
        title: title.to_string(),
        keywords: String::new(),
        description: String::new(),
        snippet: snippet.to_string(),
        crawled_at: Some(Utc::now()),
    }
}

fn open(dir: &TempDir, mode: IndexMode) -> SqliteStorage {
    SqliteStorage::new(&dir.path().join("sites.db"), mode).unwrap()
}

#[test]
fn test_capability_per_mode() {
    let expected = [
        IndexCapability::Ranked,
        IndexCapability::Unranked,
        IndexCapability::None,
    ];
    for (mode, capability) in ALL_MODES.iter().zip(expected) {
        let dir = TempDir::new().unwrap();
        assert_eq!(open(&dir, *mode).index_capability(), capability);
    }
}

#[test]
fn test_title_match_outranks_snippet_match() {
    for mode in [IndexMode::MatchOnly, IndexMode::Disabled] {
        let dir = TempDir::new().unwrap();
        let mut storage = open(&dir, mode);
        let now = Utc::now();
        // Same timestamp so only the field decides
        let mut in_snippet = record("https://s.test/", "Other", "all about kayaks");
        in_snippet.crawled_at = Some(now);
        let mut in_title = record("https://t.test/", "Kayaks", "other things");
        in_title.crawled_at = Some(now);
        storage.upsert_page(&in_snippet).unwrap();
        storage.upsert_page(&in_title).unwrap();

        let results = SearchEngine::default().search(&storage, "kayaks", 10).unwrap();
        assert_eq!(results.len(), 2, "{:?}", mode);
        assert_eq!(results[0].url, "https://t.test/");
        assert_eq!(results[0].score, TITLE_WEIGHT as f64);
        assert_eq!(results[1].score, SNIPPET_WEIGHT as f64);
    }
}

#[test]
fn test_delete_removes_from_every_tier() {
    for mode in ALL_MODES {
        let dir = TempDir::new().unwrap();
        let mut storage = open(&dir, mode);
        storage
            .upsert_page(&record("https://gone.test/", "Zeppelin", "airships"))
            .unwrap();
        storage
            .upsert_page(&record("https://stay.test/", "Balloons", "hot air"))
            .unwrap();

        assert!(storage.delete_page("https://gone.test/").unwrap());

        let engine = SearchEngine::default();
        assert!(engine.search(&storage, "zeppelin", 10).unwrap().is_empty());
        assert!(engine.search(&storage, "airships", 10).unwrap().is_empty());
        assert_eq!(engine.search(&storage, "balloons", 10).unwrap().len(), 1);
    }
}

#[test]
fn test_empty_query_in_every_mode() {
    for mode in ALL_MODES {
        let dir = TempDir::new().unwrap();
        let mut storage = open(&dir, mode);
        storage
            .upsert_page(&record("https://x.test/", "Anything", "at all"))
            .unwrap();

        let results = SearchEngine::default().search(&storage, "", 10).unwrap();
        assert!(results.is_empty());
    }
}

#[test]
fn test_heuristic_ties_prefer_recent() {
    let dir = TempDir::new().unwrap();
    let mut storage = open(&dir, IndexMode::Disabled);

    let mut old = record("https://old.test/", "Lanterns", "");
    old.crawled_at = Some(Utc::now() - Duration::days(30));
    storage.upsert_page(&old).unwrap();
    storage
        .upsert_page(&record("https://new.test/", "Lanterns", ""))
        .unwrap();

    let results = SearchEngine::default().search(&storage, "lanterns", 10).unwrap();
    assert_eq!(results[0].url, "https://new.test/");
    assert_eq!(results[1].url, "https://old.test/");
}

#[test]
fn test_ranked_search_matches_prefixes_across_fields() {
    let dir = TempDir::new().unwrap();
    let mut storage = open(&dir, IndexMode::Auto);
    let mut by_keyword = record("https://k.test/", "Untitled", "");
    by_keyword.keywords = "astronomy, telescopes".to_string();
    storage.upsert_page(&by_keyword).unwrap();
    let mut by_description = record("https://d.test/", "Stars", "");
    by_description.description = "Telescope reviews".to_string();
    storage.upsert_page(&by_description).unwrap();

    let results = SearchEngine::default().search(&storage, "telesc", 10).unwrap();
    let mut urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    urls.sort();
    assert_eq!(urls, vec!["https://d.test/", "https://k.test/"]);
}

#[test]
fn test_switching_modes_keeps_index_consistent() {
    let dir = TempDir::new().unwrap();

    {
        let mut storage = open(&dir, IndexMode::Auto);
        storage
            .upsert_page(&record("https://a.test/", "Before", ""))
            .unwrap();
    }
    {
        // Updates made while the index is disabled must not leave stale entries
        let mut storage = open(&dir, IndexMode::Disabled);
        storage
            .upsert_page(&record("https://a.test/", "After", ""))
            .unwrap();
    }

    let storage = open(&dir, IndexMode::Auto);
    let engine = SearchEngine::default();
    assert!(engine.search(&storage, "before", 10).unwrap().is_empty());
    assert_eq!(engine.search(&storage, "after", 10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_snippet_truncation_boundary() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    mount_html(&server, "/exact", &format!("<p>{}</p>", "a".repeat(500))).await;
    mount_html(&server, "/over", &format!("<p>{}</p>", "b".repeat(501))).await;

    let dir = TempDir::new().unwrap();
    let engine = Engine::new(test_config(&dir.path().join("sites.db"), "auto")).unwrap();

    let exact = engine
        .submit(&format!("{}/exact", server.uri()))
        .await
        .unwrap();
    assert_eq!(exact.snippet, "a".repeat(500));

    let over = engine
        .submit(&format!("{}/over", server.uri()))
        .await
        .unwrap();
    assert_eq!(over.snippet, format!("{}...", "b".repeat(500)));
}

#[tokio::test]
async fn test_untitled_page_displays_url() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;
    mount_html(&server, "/bare", "<p>quokka sightings</p>").await;

    let dir = TempDir::new().unwrap();
    let engine = Engine::new(test_config(&dir.path().join("sites.db"), "match-only")).unwrap();
    let url = format!("{}/bare", server.uri());
    engine.submit(&url).await.unwrap();

    let results = engine.search("quokka", None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, url);
    assert_eq!(results[0].description, "");
}
