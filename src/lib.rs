//! Sumi-Index: a small crawl-and-index search engine
//!
//! This crate fetches single pages safely (scheme, SSRF and media checks,
//! robots.txt politeness, bounded reads), extracts their metadata and
//! visible text into SQLite, and serves ranked keyword search over the
//! accumulated corpus with a full-text index when one is available.

pub mod config;
pub mod crawler;
pub mod engine;
pub mod output;
pub mod robots;
pub mod search;
pub mod storage;
pub mod url;

use std::fmt;
use thiserror::Error;

/// Classification of every failure (fatal or not) the engine can report
///
/// Callers use the kind to decide on user-facing messaging; the error's
/// `Display` output carries the human-readable detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidScheme,
    PrivateNetworkBlocked,
    MediaSkipped,
    RobotsDisallowed,
    UnsupportedContentType,
    FetchTimeout,
    FetchTransportError,
    HttpStatusError,
    /// Non-fatal: extraction produced a partial result
    ExtractionDegraded,
    /// Non-fatal: the search engine moved on to the next tier
    IndexUnavailable,
    StoreError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidScheme => "invalid_scheme",
            Self::PrivateNetworkBlocked => "private_network_blocked",
            Self::MediaSkipped => "media_skipped",
            Self::RobotsDisallowed => "robots_disallowed",
            Self::UnsupportedContentType => "unsupported_content_type",
            Self::FetchTimeout => "fetch_timeout",
            Self::FetchTransportError => "fetch_transport_error",
            Self::HttpStatusError => "http_status_error",
            Self::ExtractionDegraded => "extraction_degraded",
            Self::IndexUnavailable => "index_unavailable",
            Self::StoreError => "store_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for Sumi-Index operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SumiError {
    /// Returns the error kind, if this error belongs to the crawl or search pipeline
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Crawl(e) => Some(e.kind()),
            Self::Storage(e) => Some(e.kind()),
            Self::Config(_) | Self::Reqwest(_) | Self::Io(_) => None,
        }
    }
}

/// Failures of a single `crawl(url)` operation
///
/// Every variant aborts the crawl. None of them is retried inside the crate.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("URL scheme not allowed: {0}")]
    InvalidScheme(String),

    #[error("Private network address blocked: {0}")]
    PrivateNetworkBlocked(String),

    #[error("Looks like a media file, skipped: {0}")]
    MediaSkipped(String),

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDisallowed { url: String },

    #[error("Not an HTML page ({content_type}): {url}")]
    UnsupportedContentType { url: String, content_type: String },

    #[error("Request timeout for {url}")]
    FetchTimeout { url: String },

    #[error("HTTP error for {url}: {source}")]
    FetchTransport { url: String, source: reqwest::Error },

    #[error("Redirect from {url} refused: {reason}")]
    RedirectRefused { url: String, reason: String },

    #[error("HTTP status {code} for {url}")]
    HttpStatus { url: String, code: u16 },
}

impl CrawlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidScheme(_) => ErrorKind::InvalidScheme,
            Self::PrivateNetworkBlocked(_) => ErrorKind::PrivateNetworkBlocked,
            Self::MediaSkipped(_) => ErrorKind::MediaSkipped,
            Self::RobotsDisallowed { .. } => ErrorKind::RobotsDisallowed,
            Self::UnsupportedContentType { .. } => ErrorKind::UnsupportedContentType,
            Self::FetchTimeout { .. } => ErrorKind::FetchTimeout,
            Self::FetchTransport { .. } | Self::RedirectRefused { .. } => {
                ErrorKind::FetchTransportError
            }
            Self::HttpStatus { .. } => ErrorKind::HttpStatusError,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Sumi-Index operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for a single crawl
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Crawler;
pub use engine::Engine;
pub use search::{SearchEngine, SearchResult};
pub use storage::{PageRecord, SqliteStorage, Storage};
