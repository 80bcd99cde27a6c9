//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Index
//! database and the full-text index capability probe.

use crate::config::IndexMode;
use crate::storage::IndexCapability;
use rusqlite::Connection;

/// SQL schema for the record tables
pub const SCHEMA_SQL: &str = r#"
-- Crawled pages, one row per URL
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    keywords TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    snippet TEXT NOT NULL DEFAULT '',
    crawled_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_sites_crawled_at ON sites(crawled_at);

-- Outcome of every crawl attempt
CREATE TABLE IF NOT EXISTS crawl_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    status TEXT NOT NULL,
    detail TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_logs_status ON crawl_logs(status);

-- URLs waiting to be crawled
CREATE TABLE IF NOT EXISTS crawl_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    added_at TEXT NOT NULL
);
"#;

/// Full-text index over the searchable page fields
///
/// Entries use the `sites.id` of their record as rowid.
pub const FTS_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS sites_fts USING fts5(
    url, title, keywords, description, snippet
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Creates the full-text index if `mode` allows it and reports what it supports
///
/// `disabled` drops any index left by an earlier run, since it would go
/// stale while unused. Creation failure (no FTS5 compiled in) degrades to
/// [`IndexCapability::None`]; a missing `bm25()` degrades to
/// [`IndexCapability::Unranked`].
pub fn probe_index_capability(conn: &Connection, mode: IndexMode) -> IndexCapability {
    if mode == IndexMode::Disabled {
        if let Err(e) = conn.execute_batch("DROP TABLE IF EXISTS sites_fts;") {
            tracing::warn!(error = %e, "could not drop full-text index");
        }
        return IndexCapability::None;
    }

    if let Err(e) = conn.execute_batch(FTS_SQL) {
        tracing::warn!(error = %e, "full-text index unavailable, searches will scan");
        return IndexCapability::None;
    }

    if mode == IndexMode::MatchOnly {
        return IndexCapability::Unranked;
    }

    match conn.prepare("SELECT bm25(sites_fts) FROM sites_fts LIMIT 0") {
        Ok(_) => IndexCapability::Ranked,
        Err(e) => {
            tracing::warn!(error = %e, "bm25 ranking unavailable, using unranked matching");
            IndexCapability::Unranked
        }
    }
}
