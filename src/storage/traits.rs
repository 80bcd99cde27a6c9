//! Storage traits and error types
//!
//! This module defines the trait interface for the record store and its
//! optional full-text index, along with the associated error types.

use crate::storage::{CrawlLogRecord, CrawlStatus, IndexCapability, PageRecord, QueuedUrl};
use crate::ErrorKind;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Full-text index unavailable: {0}")]
    IndexUnavailable(String),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexUnavailable(_) => ErrorKind::IndexUnavailable,
            Self::Database(_) | Self::Sqlite(_) => ErrorKind::StoreError,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The `url` of a [`PageRecord`] is its identity. Implementations keep the
/// full-text index in step with the records: an index entry always
/// resolves to exactly one record.
pub trait Storage {
    // ===== Page Records =====

    /// Inserts a page, or fully overwrites the one stored under the same URL
    ///
    /// Any stale index entry for the URL is replaced in the same operation.
    ///
    /// # Returns
    ///
    /// The record's row ID (stable across overwrites)
    fn upsert_page(&mut self, page: &PageRecord) -> StorageResult<i64>;

    /// Gets a page by URL
    fn get_page(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Deletes a page and its index entry
    ///
    /// Returns `false` if no page was stored under `url`.
    fn delete_page(&mut self, url: &str) -> StorageResult<bool>;

    /// Lists up to `limit` pages, most recently crawled first
    fn list_pages(&self, limit: usize) -> StorageResult<Vec<PageRecord>>;

    /// Gets total page count
    fn count_pages(&self) -> StorageResult<u64>;

    // ===== Full-Text Index =====

    /// What the full-text index can do, as probed when the store was opened
    fn index_capability(&self) -> IndexCapability;

    /// Prefix-matches every term and returns pages with their relevance
    /// score, best (lowest) first
    fn match_ranked(&self, terms: &[String], limit: usize)
        -> StorageResult<Vec<(PageRecord, f64)>>;

    /// Prefix-matches every term without ranking
    fn match_unranked(&self, terms: &[String], limit: usize) -> StorageResult<Vec<PageRecord>>;

    /// Drops every index entry and re-indexes all stored pages
    ///
    /// # Returns
    ///
    /// The number of pages indexed
    fn rebuild_index(&mut self) -> StorageResult<usize>;

    // ===== Crawl Log =====

    /// Appends the outcome of one crawl attempt
    fn record_crawl_log(&mut self, url: &str, status: CrawlStatus, detail: &str)
        -> StorageResult<()>;

    /// Gets the latest log entries, newest first
    fn recent_crawl_logs(&self, limit: usize) -> StorageResult<Vec<CrawlLogRecord>>;

    /// Counts log entries with the given status
    fn count_crawl_logs(&self, status: CrawlStatus) -> StorageResult<u64>;

    // ===== Crawl Queue =====

    /// Queues a URL for a later crawl
    ///
    /// Returns `false` if the URL was already queued.
    fn enqueue_url(&mut self, url: &str) -> StorageResult<bool>;

    /// Lists queued URLs in insertion order
    fn list_queue(&self, limit: usize) -> StorageResult<Vec<QueuedUrl>>;

    /// Removes and returns the oldest queued URL
    fn pop_from_queue(&mut self) -> StorageResult<Option<QueuedUrl>>;

    /// Gets the number of queued URLs
    fn count_queue(&self) -> StorageResult<u64>;
}
