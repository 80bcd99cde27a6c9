//! Service facade tying crawling, storage and search together
//!
//! This is what a request layer (or the CLI) talks to. Every submitted URL
//! is crawled, stored and logged; search reads the stored corpus.

use crate::config::Config;
use crate::crawler::Crawler;
use crate::output::{load_statistics, CorpusStatistics};
use crate::search::{SearchEngine, SearchResult};
use crate::storage::{CrawlLogRecord, CrawlStatus, PageRecord, QueuedUrl, SqliteStorage, Storage};
use crate::url::{canonical_key, with_default_scheme};
use crate::{Result, SumiError};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Outcome of draining the crawl queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueRunSummary {
    pub crawled: usize,
    pub failed: usize,
}

/// The crawl-and-index engine
pub struct Engine {
    config: Config,
    crawler: Crawler,
    storage: Mutex<SqliteStorage>,
    search: SearchEngine,
}

impl Engine {
    /// Opens the configured database and builds the crawler
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Engine)` - Ready to serve
    /// * `Err(SumiError)` - Database or HTTP client setup failed
    pub fn new(config: Config) -> Result<Self> {
        let storage = SqliteStorage::new(
            Path::new(&config.storage.database_path),
            config.storage.full_text_index,
        )?;
        Self::with_storage(config, storage)
    }

    /// Builds an engine over an already opened store
    pub fn with_storage(config: Config, storage: SqliteStorage) -> Result<Self> {
        let crawler = Crawler::new(&config)?;
        Ok(Self {
            config,
            crawler,
            storage: Mutex::new(storage),
            search: SearchEngine::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // Never hold the guard across an await point
    fn storage(&self) -> MutexGuard<'_, SqliteStorage> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Crawls a URL, stores the page and logs the attempt
    ///
    /// Input without a scheme is treated as `http://`. The attempt is logged
    /// whether it succeeds or not.
    ///
    /// # Returns
    ///
    /// * `Ok(PageRecord)` - The page as stored
    /// * `Err(SumiError)` - The typed crawl or storage failure
    pub async fn submit(&self, input: &str) -> Result<PageRecord> {
        let url = with_default_scheme(input);

        let page = match self.crawler.crawl(&url).await {
            Ok(page) => page,
            Err(e) => {
                let detail = format!("{}: {}", e.kind(), e);
                tracing::warn!(url = %url, kind = %e.kind(), error = %e, "crawl failed");
                self.log_attempt(&url, CrawlStatus::Error, &detail);
                return Err(e.into());
            }
        };

        let stored = self.storage().upsert_page(&page);
        match stored {
            Ok(_) => {
                self.log_attempt(&page.url, CrawlStatus::Ok, "");
                Ok(page)
            }
            Err(e) => {
                let detail = format!("{}: {}", e.kind(), e);
                tracing::error!(url = %page.url, error = %e, "could not store page");
                self.log_attempt(&page.url, CrawlStatus::Error, &detail);
                Err(e.into())
            }
        }
    }

    fn log_attempt(&self, url: &str, status: CrawlStatus, detail: &str) {
        if let Err(e) = self.storage().record_crawl_log(url, status, detail) {
            tracing::warn!(url, error = %e, "could not write crawl log");
        }
    }

    /// Searches the corpus; `limit` defaults to the configured one
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<SearchResult>> {
        let limit = limit.unwrap_or(self.config.search.default_limit);
        let storage = self.storage();
        let results = self.search.search(&*storage, query, limit)?;
        tracing::info!(query, hits = results.len(), "search");
        Ok(results)
    }

    /// Gets a stored page by URL
    pub fn get(&self, url: &str) -> Result<Option<PageRecord>> {
        Ok(self.storage().get_page(&canonical_key(url))?)
    }

    /// Removes a page and its index entry
    ///
    /// Returns `false` if no page was stored under `url`.
    pub fn delete(&self, url: &str) -> Result<bool> {
        let key = canonical_key(url);
        let removed = self.storage().delete_page(&key)?;
        tracing::info!(url = %key, removed, "delete");
        Ok(removed)
    }

    /// Rebuilds the full-text index from the stored pages
    pub fn reindex(&self) -> Result<usize> {
        let indexed = self.storage().rebuild_index()?;
        tracing::info!(indexed, "full-text index rebuilt");
        Ok(indexed)
    }

    /// Queues a URL for [`Engine::run_queue`]
    ///
    /// Returns `false` if it was already queued.
    pub fn enqueue(&self, url: &str) -> Result<bool> {
        Ok(self.storage().enqueue_url(&canonical_key(url))?)
    }

    /// Lists queued URLs, oldest first
    pub fn queue(&self, limit: usize) -> Result<Vec<QueuedUrl>> {
        Ok(self.storage().list_queue(limit)?)
    }

    /// Crawls every queued URL in insertion order
    ///
    /// A failing URL is logged and dropped from the queue; only storage
    /// failures while popping stop the run.
    pub async fn run_queue(&self) -> Result<QueueRunSummary> {
        let mut summary = QueueRunSummary::default();

        loop {
            let next = self.storage().pop_from_queue()?;
            let Some(queued) = next else {
                break;
            };

            match self.submit(&queued.url).await {
                Ok(_) => summary.crawled += 1,
                Err(e) => {
                    tracing::debug!(url = %queued.url, error = %e, "queued crawl failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(crawled = summary.crawled, failed = summary.failed, "queue drained");
        Ok(summary)
    }

    /// Gets the latest crawl log entries, newest first
    pub fn logs(&self, limit: usize) -> Result<Vec<CrawlLogRecord>> {
        Ok(self.storage().recent_crawl_logs(limit)?)
    }

    pub fn stats(&self) -> Result<CorpusStatistics> {
        let storage = self.storage();
        load_statistics(&*storage).map_err(SumiError::from)
    }
}
