//! Keyword search over the stored corpus
//!
//! Search runs through tiers picked from the store's index capability:
//!
//! 1. **Ranked**: FTS5 prefix match ordered by bm25 (lower is better)
//! 2. **Unranked**: FTS5 prefix match, candidates scored heuristically
//! 3. **Full scan**: recent records scored heuristically
//!
//! The first tier with results wins. Scores from different tiers are never
//! mixed in one result list.

mod scorer;

pub use scorer::{
    rank_candidates, score_record, tokenize, DESCRIPTION_WEIGHT, KEYWORDS_WEIGHT,
    SNIPPET_WEIGHT, TITLE_WEIGHT, URL_WEIGHT,
};

use crate::storage::{IndexCapability, PageRecord, Storage, StorageResult};
use crate::ErrorKind;
use chrono::{DateTime, Utc};

/// Candidate matches pulled from an index that cannot rank
pub const UNRANKED_CANDIDATES: usize = 500;

/// Records read when no index is usable
pub const FULL_SCAN_LIMIT: usize = 1000;

/// One search hit, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub url: String,
    /// Falls back to the URL when the page had no title
    pub title: String,
    pub keywords: String,
    pub description: String,
    pub snippet: String,
    pub crawled_at: Option<DateTime<Utc>>,
    /// Only comparable within one result list
    pub score: f64,
}

impl SearchResult {
    pub fn from_record(record: PageRecord, score: f64) -> Self {
        let title = if record.title.is_empty() {
            record.url.clone()
        } else {
            record.title
        };

        Self {
            url: record.url,
            title,
            keywords: record.keywords,
            description: record.description,
            snippet: record.snippet,
            crawled_at: record.crawled_at,
            score,
        }
    }
}

/// A search strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTier {
    Ranked,
    Unranked,
    FullScan,
}

impl SearchTier {
    /// Tiers to try, in order, for a store with the given capability
    pub fn plan(capability: IndexCapability) -> &'static [SearchTier] {
        match capability {
            IndexCapability::Ranked => &[Self::Ranked, Self::Unranked, Self::FullScan],
            IndexCapability::Unranked => &[Self::Unranked, Self::FullScan],
            IndexCapability::None => &[Self::FullScan],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ranked => "ranked",
            Self::Unranked => "unranked",
            Self::FullScan => "full_scan",
        }
    }
}

/// Tiered search engine
#[derive(Debug, Clone)]
pub struct SearchEngine {
    unranked_candidates: usize,
    full_scan_limit: usize,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(UNRANKED_CANDIDATES, FULL_SCAN_LIMIT)
    }
}

impl SearchEngine {
    pub fn new(unranked_candidates: usize, full_scan_limit: usize) -> Self {
        Self {
            unranked_candidates,
            full_scan_limit,
        }
    }

    /// Searches the store for `query`, returning at most `limit` results
    ///
    /// An empty query (or zero limit) yields no results. Index failures are
    /// logged and the next tier is tried; only a failing full scan is
    /// returned as an error.
    pub fn search<S: Storage + ?Sized>(
        &self,
        storage: &S,
        query: &str,
        limit: usize,
    ) -> StorageResult<Vec<SearchResult>> {
        let terms = tokenize(query);
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        for tier in SearchTier::plan(storage.index_capability()) {
            match self.run_tier(*tier, storage, &terms, limit) {
                Ok(results) if !results.is_empty() => {
                    tracing::debug!(tier = tier.as_str(), hits = results.len(), query, "search served");
                    return Ok(results);
                }
                Ok(_) => {
                    tracing::debug!(tier = tier.as_str(), query, "no matches in tier");
                }
                Err(e) if *tier != SearchTier::FullScan => {
                    tracing::warn!(
                        tier = tier.as_str(),
                        kind = %ErrorKind::IndexUnavailable,
                        error = %e,
                        "search tier failed, falling back"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Vec::new())
    }

    fn run_tier<S: Storage + ?Sized>(
        &self,
        tier: SearchTier,
        storage: &S,
        terms: &[String],
        limit: usize,
    ) -> StorageResult<Vec<SearchResult>> {
        match tier {
            SearchTier::Ranked => Ok(storage
                .match_ranked(terms, limit)?
                .into_iter()
                .map(|(record, score)| SearchResult::from_record(record, score))
                .collect()),
            SearchTier::Unranked => {
                let candidates = storage.match_unranked(terms, self.unranked_candidates)?;
                Ok(rank_candidates(candidates, terms, limit))
            }
            SearchTier::FullScan => {
                let candidates = storage.list_pages(self.full_scan_limit)?;
                Ok(rank_candidates(candidates, terms, limit))
            }
        }
    }
}
