//! Statistics generation from the index database
//!
//! This module provides functionality for extracting and displaying
//! corpus statistics from the storage layer.

use crate::storage::{CrawlStatus, IndexCapability, Storage, StorageResult};

/// Corpus statistics summary
#[derive(Debug, Clone)]
pub struct CorpusStatistics {
    /// Number of indexed pages
    pub total_pages: u64,

    /// URLs waiting in the crawl queue
    pub queued_urls: u64,

    /// Logged crawl attempts that stored a page
    pub successful_crawls: u64,

    /// Logged crawl attempts that failed
    pub failed_crawls: u64,

    /// What the full-text index supports
    pub index_capability: IndexCapability,
}

impl CorpusStatistics {
    /// Share of logged crawls that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let attempts = self.successful_crawls + self.failed_crawls;
        if attempts > 0 {
            (self.successful_crawls as f64 / attempts as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CorpusStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<CorpusStatistics> {
    Ok(CorpusStatistics {
        total_pages: storage.count_pages()?,
        queued_urls: storage.count_queue()?,
        successful_crawls: storage.count_crawl_logs(CrawlStatus::Ok)?,
        failed_crawls: storage.count_crawl_logs(CrawlStatus::Error)?,
        index_capability: storage.index_capability(),
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CorpusStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Indexed pages: {}", stats.total_pages);
    println!("  Queued URLs: {}", stats.queued_urls);
    println!("  Full-text index: {}", stats.index_capability);
    println!();

    println!("Crawl Log:");
    println!("  Succeeded: {}", stats.successful_crawls);
    println!("  Failed: {}", stats.failed_crawls);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} crawls)",
        stats.success_rate(),
        stats.successful_crawls,
        stats.successful_crawls + stats.failed_crawls
    );
}
