//! Plain-text rendering of search results and crawl logs

use crate::search::SearchResult;
use crate::storage::CrawlLogRecord;

/// Formats search results as a numbered list
///
/// # Arguments
///
/// * `query` - The query the results answer
/// * `results` - Results in rank order
///
/// # Returns
///
/// A formatted string, one block per result
pub fn format_search_results(query: &str, results: &[SearchResult]) -> String {
    let mut out = String::new();

    if results.is_empty() {
        out.push_str(&format!("No results for \"{}\"\n", query));
        return out;
    }

    out.push_str(&format!(
        "{} result(s) for \"{}\"\n\n",
        results.len(),
        query
    ));

    for (rank, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", rank + 1, result.title));
        out.push_str(&format!("   {}\n", result.url));
        if !result.description.is_empty() {
            out.push_str(&format!("   {}\n", result.description));
        }
        if !result.snippet.is_empty() {
            out.push_str(&format!("   {}\n", result.snippet));
        }
        let crawled = result
            .crawled_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        out.push_str(&format!(
            "   score {:.3} | crawled {}\n\n",
            result.score, crawled
        ));
    }

    out
}

/// Formats crawl log entries, one per line
pub fn format_crawl_logs(logs: &[CrawlLogRecord]) -> String {
    let mut out = String::new();

    for log in logs {
        out.push_str(&format!(
            "{} [{}] {}",
            log.created_at,
            log.status.to_db_string(),
            log.url
        ));
        if !log.detail.is_empty() {
            out.push_str(&format!(" - {}", log.detail));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CrawlStatus;

    fn result(title: &str, url: &str) -> SearchResult {
        SearchResult {
            url: url.to_string(),
            title: title.to_string(),
            keywords: String::new(),
            description: "A description".to_string(),
            snippet: String::new(),
            crawled_at: None,
            score: 3.0,
        }
    }

    #[test]
    fn test_format_search_results() {
        let text = format_search_results(
            "rust",
            &[result("First", "https://a.test/"), result("Second", "https://b.test/")],
        );
        assert!(text.starts_with("2 result(s) for \"rust\""));
        assert!(text.contains("1. First\n   https://a.test/\n   A description\n"));
        assert!(text.contains("2. Second"));
        assert!(text.contains("score 3.000 | crawled never"));
    }

    #[test]
    fn test_format_no_results() {
        assert_eq!(format_search_results("zzz", &[]), "No results for \"zzz\"\n");
    }

    #[test]
    fn test_format_crawl_logs() {
        let logs = vec![
            CrawlLogRecord {
                id: 2,
                url: "https://b.test/".to_string(),
                status: CrawlStatus::Error,
                detail: "fetch_timeout: Request timeout".to_string(),
                created_at: "2024-01-01T00:00:01Z".to_string(),
            },
            CrawlLogRecord {
                id: 1,
                url: "https://a.test/".to_string(),
                status: CrawlStatus::Ok,
                detail: String::new(),
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
        ];

        let text = format_crawl_logs(&logs);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "2024-01-01T00:00:01Z [error] https://b.test/ - fetch_timeout: Request timeout"
        );
        assert_eq!(lines[1], "2024-01-01T00:00:00Z [ok] https://a.test/");
    }
}
