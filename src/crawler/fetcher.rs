//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Following redirects hop by hop through the URL validator
//! - GET requests with a size cap and an overall timeout
//! - Charset detection and lossy decoding
//! - Error classification

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::url::{is_blocked_ip, UrlValidator};
use crate::{CrawlError, CrawlResult};
use encoding_rs::{Encoding, UTF_8};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::LOCATION;
use reqwest::{redirect::Policy, Client, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Maximum number of redirect hops followed for one request
pub const MAX_REDIRECTS: usize = 10;

type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Decoded body, at most `max_fetch_bytes` of the original bytes
    pub body: String,
    /// Whether the body was cut at the byte limit
    pub truncated: bool,
}

/// Builds an HTTP client with proper configuration
///
/// The client never follows redirects on its own; [`GuardedClient`] does
/// that. With private-network protection on, name resolution refuses any
/// host that has a blocked address.
///
/// # Example
///
/// ```no_run
/// use sumi_index::config::UserAgentConfig;
/// use sumi_index::crawler::build_http_client;
/// use sumi_index::url::UrlValidator;
///
/// let client = build_http_client(&UserAgentConfig::default(), &UrlValidator::default()).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    validator: &UrlValidator,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true);

    if validator.blocks_private_networks() {
        builder = builder.dns_resolver(Arc::new(PublicOnlyResolver));
    }

    builder.build()
}

/// Resolver that refuses hosts with any blocked address
///
/// Validation resolves a host once and the connection resolves it again,
/// so the check is repeated here where the address is actually used.
#[derive(Debug, Default)]
struct PublicOnlyResolver;

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_public(name.as_str().to_string()))
    }
}

async fn resolve_public(host: String) -> Result<Addrs, ResolveError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
        .await?
        .collect();

    if addrs.is_empty() {
        return Err(format!("{} resolved to no addresses", host).into());
    }
    if let Some(addr) = addrs.iter().find(|addr| is_blocked_ip(addr.ip())) {
        tracing::debug!(host = %host, ip = %addr.ip(), "refusing to connect to blocked address");
        return Err(format!("{} resolves to blocked address {}", host, addr.ip()).into());
    }

    let addrs: Addrs = Box::new(addrs.into_iter());
    Ok(addrs)
}

/// HTTP client that follows redirects itself
///
/// Every redirect target passes the full [`UrlValidator::validate`], DNS
/// lookup included, before it is requested.
#[derive(Debug, Clone)]
pub struct GuardedClient {
    client: Client,
    validator: UrlValidator,
    dns_timeout: Duration,
}

impl GuardedClient {
    pub fn new(client: Client, validator: UrlValidator, dns_timeout: Duration) -> Self {
        Self {
            client,
            validator,
            dns_timeout,
        }
    }

    /// Builds the validator and HTTP client described by `config`
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let validator = UrlValidator::from_config(&config.crawler);
        let client = build_http_client(&config.user_agent, &validator)?;
        Ok(Self::new(client, validator, config.crawler.dns_timeout()))
    }

    pub fn validator(&self) -> &UrlValidator {
        &self.validator
    }

    /// GETs `url`, following at most [`MAX_REDIRECTS`] redirects
    ///
    /// `url` itself must already be validated. `timeout` bounds the whole
    /// chain. A 3xx answer without a usable `Location` is returned as is.
    pub async fn get(&self, url: &Url, timeout: Duration) -> CrawlResult<Response> {
        let deadline = Instant::now() + timeout;
        let mut current = url.clone();
        let mut hops = 0;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(CrawlError::FetchTimeout {
                    url: url.to_string(),
                });
            }

            let response = self
                .client
                .get(current.clone())
                .timeout(remaining)
                .send()
                .await
                .map_err(|e| classify_reqwest_error(url.as_str(), e))?;

            let target = match redirect_target(&current, &response) {
                Some(target) if response.status().is_redirection() => target,
                _ => return Ok(response),
            };

            hops += 1;
            if hops > MAX_REDIRECTS {
                return Err(CrawlError::RedirectRefused {
                    url: url.to_string(),
                    reason: format!("more than {} redirects", MAX_REDIRECTS),
                });
            }

            tracing::debug!(from = %current, to = %target, "following redirect");
            current = self.check_redirect(url, target).await?;
        }
    }

    async fn check_redirect(&self, origin: &Url, target: Url) -> CrawlResult<Url> {
        let checked =
            tokio::time::timeout(self.dns_timeout, self.validator.validate(target.as_str())).await;

        let reason = match checked {
            Ok(Ok(url)) => return Ok(url),
            Ok(Err(e)) => format!("{} ({})", target, e),
            Err(_) => format!("DNS lookup timed out for {}", target),
        };

        Err(CrawlError::RedirectRefused {
            url: origin.to_string(),
            reason,
        })
    }
}

fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

/// Fetches HTML pages under size, time and content-type limits
///
/// Failures are returned as typed errors and never retried here.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: GuardedClient,
    timeout: Duration,
    max_bytes: usize,
}

impl Fetcher {
    pub fn new(client: GuardedClient, timeout: Duration, max_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    pub fn from_config(client: GuardedClient, config: &CrawlerConfig) -> Self {
        Self::new(client, config.fetch_timeout(), config.max_fetch_bytes)
    }

    /// Fetches a URL and decodes its body
    ///
    /// # Request Flow
    ///
    /// 1. GET with the configured overall timeout, validating each redirect
    /// 2. Non-2xx status → `HttpStatus`
    /// 3. Missing/empty Content-Type or one without `text/html` → `UnsupportedContentType`
    /// 4. Read at most `max_bytes` (one chunk past the limit is read and dropped)
    /// 5. Decode with the header's charset (default UTF-8), replacing bad sequences
    pub async fn fetch(&self, url: &Url) -> CrawlResult<FetchedPage> {
        let url_str = url.as_str();

        let response = self.client.get(url, self.timeout).await?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(CrawlError::HttpStatus {
                url: url_str.to_string(),
                code: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .trim()
            .to_string();

        if !is_html_content_type(&content_type) {
            return Err(CrawlError::UnsupportedContentType {
                url: url_str.to_string(),
                content_type,
            });
        }

        let (bytes, truncated) = read_capped(response, self.max_bytes)
            .await
            .map_err(|e| classify_reqwest_error(url_str, e))?;

        if truncated {
            tracing::debug!(url = url_str, limit = self.max_bytes, "body truncated");
        }

        let body = decode_body(&bytes, &content_type);

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
            truncated,
        })
    }
}

/// Returns true for a non-empty Content-Type that names `text/html`
pub fn is_html_content_type(content_type: &str) -> bool {
    !content_type.is_empty() && content_type.to_ascii_lowercase().contains("text/html")
}

/// Maps a reqwest error to the crawl error taxonomy
pub(crate) fn classify_reqwest_error(url: &str, error: reqwest::Error) -> CrawlError {
    if error.is_timeout() {
        CrawlError::FetchTimeout {
            url: url.to_string(),
        }
    } else {
        CrawlError::FetchTransport {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Reads a response body, keeping at most `limit` bytes
///
/// Reading continues until the body ends or more than `limit` bytes have
/// arrived; the excess is discarded. The flag reports whether the body was
/// longer than the limit.
pub(crate) async fn read_capped(
    mut response: Response,
    limit: usize,
) -> Result<(Vec<u8>, bool), reqwest::Error> {
    let mut buf = Vec::with_capacity(limit.min(64 * 1024));

    while let Some(chunk) = response.chunk().await? {
        buf.extend_from_slice(&chunk);
        if buf.len() > limit {
            buf.truncate(limit);
            return Ok((buf, true));
        }
    }

    Ok((buf, false))
}

/// Extracts the `charset=` label from a Content-Type value
///
/// # Examples
///
/// ```
/// use sumi_index::crawler::charset_from_content_type;
///
/// assert_eq!(charset_from_content_type("text/html; charset=\"GBK\""), Some("GBK"));
/// assert_eq!(charset_from_content_type("text/html"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    let lower = content_type.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let rest = &content_type[start..];
    let end = rest
        .find(|c: char| c == ';' || c.is_whitespace())
        .unwrap_or(rest.len());
    let label = rest[..end].trim_matches(|c: char| c == '"' || c == '\'');

    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Decodes body bytes using the Content-Type charset, defaulting to UTF-8
///
/// Unknown labels fall back to UTF-8. Invalid sequences become U+FFFD.
pub fn decode_body(bytes: &[u8], content_type: &str) -> String {
    let encoding = charset_from_content_type(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "replaced malformed byte sequences");
    }
    text.into_owned()
}
