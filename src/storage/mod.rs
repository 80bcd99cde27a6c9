//! Storage module for persisting crawled pages
//!
//! This module handles all database operations for the engine, including:
//! - SQLite database initialization and schema management
//! - Page record upserts, lookups and deletes
//! - The FTS5 full-text index and its capability probe
//! - The crawl log and the crawl queue

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use std::fmt;

/// A crawled page as stored
///
/// Every successful crawl of a URL overwrites all of these fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    /// Raw `<meta name="keywords">` content
    pub keywords: String,
    pub description: String,
    /// At most 500 characters of visible text, plus `...` when cut
    pub snippet: String,
    pub crawled_at: Option<DateTime<Utc>>,
}

/// Represents one crawl attempt in the log
#[derive(Debug, Clone)]
pub struct CrawlLogRecord {
    pub id: i64,
    pub url: String,
    pub status: CrawlStatus,
    pub detail: String,
    pub created_at: String,
}

/// Outcome of a crawl attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    Ok,
    Error,
}

impl CrawlStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(Self::Ok),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A URL waiting in the crawl queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedUrl {
    pub id: i64,
    pub url: String,
    pub added_at: String,
}

/// What the full-text index supports in this database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCapability {
    /// Prefix matching with bm25 relevance ranking
    Ranked,
    /// Prefix matching only
    Unranked,
    /// No full-text index
    None,
}

impl IndexCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ranked => "ranked",
            Self::Unranked => "unranked",
            Self::None => "none",
        }
    }
}

impl fmt::Display for IndexCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
