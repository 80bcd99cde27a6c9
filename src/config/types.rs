use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Index
///
/// Every section is optional; missing keys fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub robots: RobotsConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// URL schemes that may be crawled
    #[serde(rename = "allowed-schemes")]
    pub allowed_schemes: Vec<String>,

    /// Reject hosts that are or resolve to loopback/private/reserved addresses
    #[serde(rename = "block-private-networks")]
    pub block_private_networks: bool,

    /// Maximum number of body bytes kept from a page
    #[serde(rename = "max-fetch-bytes")]
    pub max_fetch_bytes: usize,

    /// Overall timeout for a page fetch (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Bound on DNS resolution during URL validation (seconds)
    #[serde(rename = "dns-timeout-secs")]
    pub dns_timeout_secs: u64,

    /// Upper bound on a robots.txt Crawl-delay we are willing to wait (seconds)
    #[serde(rename = "max-crawl-delay-secs")]
    pub max_crawl_delay_secs: f64,
}

/// Longest politeness wait a configuration may ask for (seconds)
pub const MAX_CRAWL_DELAY_SECS: f64 = 10.0;

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            block_private_networks: true,
            max_fetch_bytes: 200 * 1024,
            fetch_timeout_secs: 8,
            dns_timeout_secs: 5,
            max_crawl_delay_secs: MAX_CRAWL_DELAY_SECS,
        }
    }
}

impl CrawlerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    /// Politeness cap, never above [`MAX_CRAWL_DELAY_SECS`]
    ///
    /// A negative or non-finite setting means no waiting.
    pub fn max_crawl_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_crawl_delay_secs.min(MAX_CRAWL_DELAY_SECS))
            .unwrap_or(Duration::ZERO)
    }
}

/// robots.txt fetching and caching
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RobotsConfig {
    /// How long a fetched policy stays fresh (seconds)
    #[serde(rename = "cache-ttl-secs")]
    pub cache_ttl_secs: u64,

    /// Timeout for a single robots.txt request (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Maximum number of robots.txt bytes read
    #[serde(rename = "max-bytes")]
    pub max_bytes: usize,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            fetch_timeout_secs: 4,
            max_bytes: 64 * 1024,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "sumi-index".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Mozilla/5.0 (compatible; Name/Version; +ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "Mozilla/5.0 (compatible; {}/{}; +{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Which full-text index the store should try to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexMode {
    /// Probe for FTS5 with bm25 ranking, degrade as needed
    #[default]
    Auto,
    /// Use FTS5 matching but never bm25 ranking
    MatchOnly,
    /// Never create or query the full-text index
    Disabled,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    #[serde(rename = "full-text-index")]
    pub full_text_index: IndexMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "sites.db".to_string(),
            full_text_index: IndexMode::Auto,
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result limit used when the caller does not give one
    #[serde(rename = "default-limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}
