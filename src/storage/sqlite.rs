//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait,
//! with an FTS5 table as the full-text index.

use crate::config::IndexMode;
use crate::storage::schema::{initialize_schema, probe_index_capability};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CrawlLogRecord, CrawlStatus, IndexCapability, PageRecord, QueuedUrl};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const PAGE_COLUMNS: &str = "s.url, s.title, s.keywords, s.description, s.snippet, s.crawled_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
    capability: IndexCapability,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and probes the full-text index
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `mode` - Which full-text index to try
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path, mode: IndexMode) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::from_connection(conn, mode)
    }

    /// Creates an in-memory database
    pub fn new_in_memory(mode: IndexMode) -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, mode)
    }

    fn from_connection(conn: Connection, mode: IndexMode) -> StorageResult<Self> {
        initialize_schema(&conn)?;
        let capability = probe_index_capability(&conn, mode);
        tracing::debug!(capability = %capability, "full-text index probed");

        let mut storage = Self { conn, capability };
        storage.reconcile_index()?;
        Ok(storage)
    }

    /// Rebuilds the index when it has drifted from the records, e.g. after
    /// the database was used with the index disabled
    fn reconcile_index(&mut self) -> StorageResult<()> {
        if self.capability == IndexCapability::None {
            return Ok(());
        }

        let pages = self.count_pages()?;
        let entries: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sites_fts", [], |row| row.get(0))?;

        if entries as u64 != pages {
            tracing::info!(pages, entries, "full-text index out of step, rebuilding");
            self.rebuild_index()?;
        }
        Ok(())
    }

    fn require_index(&self, ranked: bool) -> StorageResult<()> {
        match (self.capability, ranked) {
            (IndexCapability::Ranked, _) | (IndexCapability::Unranked, false) => Ok(()),
            (capability, _) => Err(StorageError::IndexUnavailable(format!(
                "{} match not supported (index is {})",
                if ranked { "ranked" } else { "unranked" },
                capability
            ))),
        }
    }
}

/// Builds an FTS5 prefix query: every term quoted and starred
///
/// Double quotes inside a term are doubled, so user input cannot inject
/// FTS5 operators.
pub(crate) fn prefix_query(terms: &[String]) -> String {
    terms
        .iter()
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    let crawled_at: Option<String> = row.get(5)?;
    Ok(PageRecord {
        url: row.get(0)?,
        title: row.get(1)?,
        keywords: row.get(2)?,
        description: row.get(3)?,
        snippet: row.get(4)?,
        crawled_at: crawled_at
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlLogRecord> {
    Ok(CrawlLogRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        status: CrawlStatus::from_db_string(&row.get::<_, String>(2)?)
            .unwrap_or(CrawlStatus::Error),
        detail: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn queued_from_row(row: &Row<'_>) -> rusqlite::Result<QueuedUrl> {
    Ok(QueuedUrl {
        id: row.get(0)?,
        url: row.get(1)?,
        added_at: row.get(2)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Page Records =====

    fn upsert_page(&mut self, page: &PageRecord) -> StorageResult<i64> {
        let crawled_at = page.crawled_at.as_ref().map(format_timestamp);
        let indexed = self.capability != IndexCapability::None;

        let tx = self.conn.transaction()?;

        let id: i64 = tx.query_row(
            "INSERT INTO sites (url, title, keywords, description, snippet, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                keywords = excluded.keywords,
                description = excluded.description,
                snippet = excluded.snippet,
                crawled_at = excluded.crawled_at
             RETURNING id",
            params![
                page.url,
                page.title,
                page.keywords,
                page.description,
                page.snippet,
                crawled_at
            ],
            |row| row.get(0),
        )?;

        if indexed {
            tx.execute("DELETE FROM sites_fts WHERE rowid = ?1", params![id])?;
            tx.execute(
                "INSERT INTO sites_fts (rowid, url, title, keywords, description, snippet)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    page.url,
                    page.title,
                    page.keywords,
                    page.description,
                    page.snippet
                ],
            )?;
        }

        tx.commit()?;
        Ok(id)
    }

    fn get_page(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sites s WHERE s.url = ?1", PAGE_COLUMNS),
                params![url],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn delete_page(&mut self, url: &str) -> StorageResult<bool> {
        let indexed = self.capability != IndexCapability::None;
        let tx = self.conn.transaction()?;

        let id: Option<i64> = tx
            .query_row("SELECT id FROM sites WHERE url = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()?;

        let Some(id) = id else {
            return Ok(false);
        };

        if indexed {
            tx.execute("DELETE FROM sites_fts WHERE rowid = ?1", params![id])?;
        }
        tx.execute("DELETE FROM sites WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(true)
    }

    fn list_pages(&self, limit: usize) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sites s ORDER BY s.crawled_at DESC, s.id DESC LIMIT ?1",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map(params![limit as i64], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sites", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Full-Text Index =====

    fn index_capability(&self) -> IndexCapability {
        self.capability
    }

    fn match_ranked(
        &self,
        terms: &[String],
        limit: usize,
    ) -> StorageResult<Vec<(PageRecord, f64)>> {
        self.require_index(true)?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, bm25(sites_fts) AS score
             FROM sites_fts
             JOIN sites s ON s.id = sites_fts.rowid
             WHERE sites_fts MATCH ?1
             ORDER BY score ASC
             LIMIT ?2",
            PAGE_COLUMNS
        ))?;

        let matches = stmt
            .query_map(params![prefix_query(terms), limit as i64], |row| {
                Ok((page_from_row(row)?, row.get::<_, f64>(6)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn match_unranked(&self, terms: &[String], limit: usize) -> StorageResult<Vec<PageRecord>> {
        self.require_index(false)?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}
             FROM sites_fts
             JOIN sites s ON s.id = sites_fts.rowid
             WHERE sites_fts MATCH ?1
             LIMIT ?2",
            PAGE_COLUMNS
        ))?;

        let matches = stmt
            .query_map(params![prefix_query(terms), limit as i64], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn rebuild_index(&mut self) -> StorageResult<usize> {
        if self.capability == IndexCapability::None {
            return Err(StorageError::IndexUnavailable(
                "full-text index is disabled or unsupported".to_string(),
            ));
        }

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM sites_fts", [])?;
        let indexed = tx.execute(
            "INSERT INTO sites_fts (rowid, url, title, keywords, description, snippet)
             SELECT id, url, title, keywords, description, snippet FROM sites",
            [],
        )?;
        tx.commit()?;

        Ok(indexed)
    }

    // ===== Crawl Log =====

    fn record_crawl_log(
        &mut self,
        url: &str,
        status: CrawlStatus,
        detail: &str,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO crawl_logs (url, status, detail, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![url, status.to_db_string(), detail, now_timestamp()],
        )?;
        Ok(())
    }

    fn recent_crawl_logs(&self, limit: usize) -> StorageResult<Vec<CrawlLogRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, status, detail, created_at FROM crawl_logs ORDER BY id DESC LIMIT ?1",
        )?;

        let logs = stmt
            .query_map(params![limit as i64], log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn count_crawl_logs(&self, status: CrawlStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawl_logs WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Crawl Queue =====

    fn enqueue_url(&mut self, url: &str) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO crawl_queue (url, added_at) VALUES (?1, ?2)",
            params![url, now_timestamp()],
        )?;
        Ok(inserted > 0)
    }

    fn list_queue(&self, limit: usize) -> StorageResult<Vec<QueuedUrl>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, url, added_at FROM crawl_queue ORDER BY id ASC LIMIT ?1")?;

        let queued = stmt
            .query_map(params![limit as i64], queued_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(queued)
    }

    fn pop_from_queue(&mut self) -> StorageResult<Option<QueuedUrl>> {
        let tx = self.conn.transaction()?;

        let next = tx
            .query_row(
                "SELECT id, url, added_at FROM crawl_queue ORDER BY id ASC LIMIT 1",
                [],
                queued_from_row,
            )
            .optional()?;

        if let Some(queued) = &next {
            tx.execute("DELETE FROM crawl_queue WHERE id = ?1", params![queued.id])?;
        }

        tx.commit()?;
        Ok(next)
    }

    fn count_queue(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM crawl_queue", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
