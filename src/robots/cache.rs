//! Robots.txt caching implementation
//!
//! This module keeps one policy per `(scheme, host)` and refreshes it once
//! the configured TTL has passed. Fetch failures never block crawling: they
//! are cached as an allow-all policy.

use crate::config::RobotsConfig;
use crate::crawler::{classify_reqwest_error, read_capped, GuardedClient};
use crate::robots::{parse_robots, RobotsPolicy};
use crate::CrawlError;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

/// Cached robots.txt data for a host
///
/// This structure stores the parsed policy along with the timestamp when it
/// was fetched, allowing for cache expiration checks.
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed policy
    pub policy: RobotsPolicy,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(policy: RobotsPolicy) -> Self {
        Self {
            policy,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached policy is older than `ttl`
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    /// Returns the age of the cached policy
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Ten years; keeps the chrono conversion in range
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

type CacheKey = (String, String);
type Slot = Arc<tokio::sync::Mutex<Option<CachedRobots>>>;

/// Shared, TTL-bounded robots.txt policy cache
///
/// Each `(scheme, host)` key owns a slot guarded by an async mutex, so the
/// check-fetch-store sequence for one host is serialized while different
/// hosts proceed independently. A refresh replaces the whole entry.
pub struct RobotsCache {
    client: GuardedClient,
    user_agent: String,
    ttl: Duration,
    fetch_timeout: std::time::Duration,
    max_bytes: usize,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt requests; redirects are
    ///   validated like any other
    /// * `user_agent` - Agent string matched against `User-agent` groups
    /// * `config` - TTL, timeout and read cap
    pub fn new(
        client: GuardedClient,
        user_agent: impl Into<String>,
        config: &RobotsConfig,
    ) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            ttl: Duration::seconds(config.cache_ttl_secs.min(MAX_TTL_SECS) as i64),
            fetch_timeout: std::time::Duration::from_secs(config.fetch_timeout_secs),
            max_bytes: config.max_bytes,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the policy for the host of `url`
    ///
    /// The host key includes a non-default port.
    pub async fn policy_for_url(&self, url: &Url) -> RobotsPolicy {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return RobotsPolicy::allow_all(),
        };
        self.policy_for(url.scheme(), &host).await
    }

    /// Returns the cached policy for `(scheme, host)`, fetching it on a miss
    /// or once the entry is older than the TTL
    pub async fn policy_for(&self, scheme: &str, host: &str) -> RobotsPolicy {
        let slot = self.slot(scheme, host);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if !cached.is_stale(self.ttl) {
                tracing::debug!(scheme, host, "robots.txt cache hit");
                return cached.policy.clone();
            }
        }

        let policy = self.fetch_policy(scheme, host).await;
        *entry = Some(CachedRobots::new(policy.clone()));
        policy
    }

    /// Number of hosts with a slot in the cache
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, scheme: &str, host: &str) -> Slot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots
            .entry((scheme.to_lowercase(), host.to_lowercase()))
            .or_default()
            .clone()
    }

    /// Fetches and parses robots.txt, never failing
    ///
    /// An https failure is retried once over http; if that fails too the
    /// result is an allow-all policy.
    async fn fetch_policy(&self, scheme: &str, host: &str) -> RobotsPolicy {
        match self.try_fetch(scheme, host).await {
            Ok(policy) => policy,
            Err(e) if scheme == "https" => {
                tracing::debug!(host, error = %e, "robots.txt over https failed, trying http");
                match self.try_fetch("http", host).await {
                    Ok(policy) => policy,
                    Err(e) => {
                        tracing::warn!(host, error = %e, "robots.txt unavailable, allowing all");
                        RobotsPolicy::allow_all()
                    }
                }
            }
            Err(e) => {
                tracing::warn!(host, error = %e, "robots.txt unavailable, allowing all");
                RobotsPolicy::allow_all()
            }
        }
    }

    async fn try_fetch(&self, scheme: &str, host: &str) -> Result<RobotsPolicy, CrawlError> {
        let robots_url = format!("{}://{}/robots.txt", scheme, host);
        tracing::debug!(url = %robots_url, "fetching robots.txt");

        let parsed = Url::parse(&robots_url)
            .map_err(|e| CrawlError::InvalidScheme(format!("{}: {}", robots_url, e)))?;
        let response = self.client.get(&parsed, self.fetch_timeout).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::HttpStatus {
                url: robots_url,
                code: status.as_u16(),
            });
        }

        let (bytes, _truncated) = read_capped(response, self.max_bytes)
            .await
            .map_err(|e| classify_reqwest_error(&robots_url, e))?;
        let content = String::from_utf8_lossy(&bytes);

        Ok(parse_robots(&content, &self.user_agent))
    }
}
