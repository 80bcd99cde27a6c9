//! Heuristic relevance scoring
//!
//! Used when the full-text index cannot rank: every term is looked up as a
//! case-insensitive substring of each field, and matching fields add their
//! weight plus one point per extra occurrence.

use crate::search::SearchResult;
use crate::storage::PageRecord;

pub const TITLE_WEIGHT: u32 = 3;
pub const KEYWORDS_WEIGHT: u32 = 2;
pub const DESCRIPTION_WEIGHT: u32 = 2;
pub const SNIPPET_WEIGHT: u32 = 1;
pub const URL_WEIGHT: u32 = 1;

/// Splits a query into terms on whitespace
///
/// # Examples
///
/// ```
/// use sumi_index::search::tokenize;
///
/// assert_eq!(tokenize("  rust   crawler "), vec!["rust", "crawler"]);
/// assert!(tokenize("   ").is_empty());
/// ```
pub fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

/// Scores one record against already lower-cased terms
pub fn score_record(record: &PageRecord, terms: &[String]) -> u32 {
    let fields = [
        (record.title.to_lowercase(), TITLE_WEIGHT),
        (record.keywords.to_lowercase(), KEYWORDS_WEIGHT),
        (record.description.to_lowercase(), DESCRIPTION_WEIGHT),
        (record.snippet.to_lowercase(), SNIPPET_WEIGHT),
        (record.url.to_lowercase(), URL_WEIGHT),
    ];

    terms
        .iter()
        .map(|term| {
            fields
                .iter()
                .map(|(field, weight)| field_score(field, term, *weight))
                .sum::<u32>()
        })
        .sum()
}

fn field_score(field: &str, term: &str, weight: u32) -> u32 {
    match field.matches(term).count() as u32 {
        0 => 0,
        occurrences => weight + occurrences - 1,
    }
}

/// Scores candidates, drops non-matches and returns the best `limit`
///
/// Ties go to the most recently crawled record; a missing timestamp
/// sorts last.
pub fn rank_candidates(
    candidates: Vec<PageRecord>,
    terms: &[String],
    limit: usize,
) -> Vec<SearchResult> {
    let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();

    let mut scored: Vec<(u32, PageRecord)> = candidates
        .into_iter()
        .map(|record| (score_record(&record, &terms), record))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .cmp(score_a)
            .then_with(|| b.crawled_at.cmp(&a.crawled_at))
    });
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(score, record)| SearchResult::from_record(record, score as f64))
        .collect()
}
