//! URL safety validation
//!
//! Decides whether a submitted URL may be fetched at all, before any
//! request reaches the target host.

use crate::config::CrawlerConfig;
use crate::url::address::is_blocked_ip;
use crate::url::media::is_media_path;
use crate::{CrawlError, CrawlResult};
use std::net::IpAddr;
use url::{Host, Url};

/// Scheme, SSRF and media gatekeeper
///
/// Checks run in a fixed order:
/// 1. the URL parses and its scheme is allow-listed
/// 2. (if enabled) the host is not, and does not resolve to, a
///    loopback/private/reserved address
/// 3. the path does not name a media or binary file
#[derive(Debug, Clone)]
pub struct UrlValidator {
    allowed_schemes: Vec<String>,
    block_private_networks: bool,
}

impl UrlValidator {
    pub fn new(allowed_schemes: Vec<String>, block_private_networks: bool) -> Self {
        Self {
            allowed_schemes,
            block_private_networks,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.allowed_schemes.clone(),
            config.block_private_networks,
        )
    }

    pub fn blocks_private_networks(&self) -> bool {
        self.block_private_networks
    }

    /// Parses the URL and checks its scheme against the allow-list
    pub fn check_scheme(&self, url: &str) -> CrawlResult<Url> {
        let parsed = Url::parse(url)
            .map_err(|e| CrawlError::InvalidScheme(format!("{}: {}", url, e)))?;

        if !self.is_scheme_allowed(parsed.scheme()) {
            return Err(CrawlError::InvalidScheme(parsed.scheme().to_string()));
        }

        Ok(parsed)
    }

    pub fn is_scheme_allowed(&self, scheme: &str) -> bool {
        self.allowed_schemes.iter().any(|s| s == scheme)
    }

    /// Validates a URL, resolving its hostname when private-network
    /// protection is on
    ///
    /// The DNS lookup is not time-bounded here; callers wrap this in their
    /// own timeout.
    ///
    /// # Returns
    ///
    /// * `Ok(Url)` - The parsed URL, safe to fetch
    /// * `Err(CrawlError)` - `InvalidScheme`, `PrivateNetworkBlocked` or `MediaSkipped`
    pub async fn validate(&self, url: &str) -> CrawlResult<Url> {
        let parsed = self.check_scheme(url)?;

        if self.block_private_networks {
            self.check_host(&parsed).await?;
        }

        if is_media_path(parsed.path()) {
            return Err(CrawlError::MediaSkipped(parsed.path().to_string()));
        }

        Ok(parsed)
    }

    /// Rejects a host that is, or resolves to, any blocked address
    ///
    /// Lookup failures and empty answers are rejections.
    async fn check_host(&self, url: &Url) -> CrawlResult<()> {
        let addrs: Vec<IpAddr> = match url.host() {
            Some(Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
            Some(Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
            Some(Host::Domain(domain)) => {
                // A bracket-less literal can slip through as a domain
                if let Ok(ip) = domain.parse::<IpAddr>() {
                    vec![ip]
                } else {
                    let port = url.port_or_known_default().unwrap_or(80);
                    tokio::net::lookup_host((domain, port))
                        .await
                        .map_err(|e| {
                            CrawlError::PrivateNetworkBlocked(format!(
                                "could not resolve {}: {}",
                                domain, e
                            ))
                        })?
                        .map(|addr| addr.ip())
                        .collect()
                }
            }
            None => {
                return Err(CrawlError::PrivateNetworkBlocked(format!(
                    "no host in {}",
                    url
                )))
            }
        };

        if addrs.is_empty() {
            return Err(CrawlError::PrivateNetworkBlocked(format!(
                "{} resolved to no addresses",
                url.host_str().unwrap_or_default()
            )));
        }

        if let Some(ip) = addrs.iter().find(|ip| is_blocked_ip(**ip)) {
            tracing::debug!(host = url.host_str(), %ip, "blocked private address");
            return Err(CrawlError::PrivateNetworkBlocked(format!(
                "{} resolves to {}",
                url.host_str().unwrap_or_default(),
                ip
            )));
        }

        Ok(())
    }
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}
