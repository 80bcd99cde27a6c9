//! Output module for command-line reports
//!
//! This module handles:
//! - Rendering search results and crawl logs as text
//! - Recording and displaying corpus statistics

mod results;
pub mod stats;

pub use results::{format_crawl_logs, format_search_results};
pub use stats::{load_statistics, print_statistics, CorpusStatistics};
