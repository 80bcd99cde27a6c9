//! Crawl orchestration
//!
//! Composes the single-page pipeline:
//! validation → robots check → politeness delay → fetch → extraction.
//! The first failing stage ends the crawl; nothing is retried here.

use crate::config::Config;
use crate::crawler::{extract, Fetcher, GuardedClient};
use crate::robots::{is_allowed, RobotsCache};
use crate::storage::PageRecord;
use crate::url::UrlValidator;
use crate::{CrawlError, CrawlResult, ErrorKind};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Single-page crawler
///
/// Cheap to share behind an `Arc`; concurrent crawls only contend on the
/// robots cache entry of the host they target.
pub struct Crawler {
    validator: UrlValidator,
    robots: Arc<RobotsCache>,
    fetcher: Fetcher,
    dns_timeout: Duration,
    max_crawl_delay: Duration,
}

impl Crawler {
    /// Builds a crawler and its HTTP client from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(SumiError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> crate::Result<Self> {
        let client = GuardedClient::from_config(config)?;
        let validator = client.validator().clone();
        let robots = Arc::new(RobotsCache::new(
            client.clone(),
            config.user_agent.header_value(),
            &config.robots,
        ));
        let fetcher = Fetcher::from_config(client, &config.crawler);

        Ok(Self::with_parts(
            validator,
            robots,
            fetcher,
            config.crawler.dns_timeout(),
            config.crawler.max_crawl_delay(),
        ))
    }

    /// Assembles a crawler from existing parts, e.g. to share one robots cache
    pub fn with_parts(
        validator: UrlValidator,
        robots: Arc<RobotsCache>,
        fetcher: Fetcher,
        dns_timeout: Duration,
        max_crawl_delay: Duration,
    ) -> Self {
        Self {
            validator,
            robots,
            fetcher,
            dns_timeout,
            max_crawl_delay,
        }
    }

    pub fn robots(&self) -> &Arc<RobotsCache> {
        &self.robots
    }

    /// Crawls one URL into a [`PageRecord`] stamped with the current time
    ///
    /// # Errors
    ///
    /// Any [`CrawlError`]. A DNS lookup that outlives the configured bound
    /// is reported as `PrivateNetworkBlocked`, since the host could not be
    /// proven safe.
    pub async fn crawl(&self, url: &str) -> CrawlResult<PageRecord> {
        let validated = match tokio::time::timeout(self.dns_timeout, self.validator.validate(url))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(CrawlError::PrivateNetworkBlocked(format!(
                    "DNS lookup timed out for {}",
                    url
                )))
            }
        };

        let policy = self.robots.policy_for_url(&validated).await;
        if !is_allowed(&validated, &policy) {
            return Err(CrawlError::RobotsDisallowed {
                url: validated.to_string(),
            });
        }

        if let Some(delay) = politeness_delay(policy.crawl_delay_secs, self.max_crawl_delay) {
            tracing::debug!(url = %validated, delay_ms = delay.as_millis() as u64, "honoring crawl delay");
            tokio::time::sleep(delay).await;
        }

        let fetched = self.fetcher.fetch(&validated).await?;
        if fetched.final_url != validated.as_str() {
            tracing::debug!(url = %validated, final_url = %fetched.final_url, "redirected");
        }
        let page = extract(&fetched.body);

        if page.is_degraded() {
            tracing::debug!(
                url = %validated,
                kind = %ErrorKind::ExtractionDegraded,
                errors = page.parse_errors,
                "markup repaired during extraction"
            );
        }

        tracing::info!(url = %validated, title = %page.title, "crawled");

        Ok(PageRecord {
            url: validated.to_string(),
            title: page.title.clone(),
            keywords: page.keywords().to_string(),
            description: page.description().to_string(),
            snippet: page.snippet(),
            crawled_at: Some(Utc::now()),
        })
    }
}

/// Returns how long to wait before fetching, given a host's Crawl-delay
///
/// The wait never exceeds `cap`; zero, negative or NaN delays mean no wait.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sumi_index::crawler::politeness_delay;
///
/// let cap = Duration::from_secs(10);
/// assert_eq!(politeness_delay(2.5, cap), Some(Duration::from_millis(2500)));
/// assert_eq!(politeness_delay(60.0, cap), Some(cap));
/// assert_eq!(politeness_delay(0.0, cap), None);
/// ```
pub fn politeness_delay(requested_secs: f64, cap: Duration) -> Option<Duration> {
    if requested_secs.is_nan() || requested_secs <= 0.0 {
        return None;
    }

    let delay = if requested_secs >= cap.as_secs_f64() {
        cap
    } else {
        Duration::from_secs_f64(requested_secs)
    };

    (!delay.is_zero()).then_some(delay)
}
