//! Crawler module for single-page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Bounded HTTP fetching with charset decoding
//! - HTML content extraction (title, meta, visible text)
//! - Crawl orchestration with robots.txt and politeness delays

mod extractor;
mod fetcher;
mod orchestrator;

pub use extractor::{
    collapse_whitespace, extract, make_snippet, ExtractedPage, ELLIPSIS, SNIPPET_CHARS,
};
pub use fetcher::{
    build_http_client, charset_from_content_type, decode_body, is_html_content_type,
    FetchedPage, Fetcher, GuardedClient, MAX_REDIRECTS,
};
pub use orchestrator::{politeness_delay, Crawler};

pub(crate) use fetcher::{classify_reqwest_error, read_capped};
