//! Robots.txt parser implementation
//!
//! A deliberately small parser: only `User-agent`, `Disallow` and
//! `Crawl-delay` are understood, and paths are matched as plain string
//! prefixes.

use std::time::Duration;
use url::Url;

/// Crawl policy for one `(scheme, host)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsPolicy {
    /// Disallowed path prefixes in file order; `/` blocks everything
    pub disallowed_prefixes: Vec<String>,

    /// Largest Crawl-delay across the groups that apply to us (seconds)
    pub crawl_delay_secs: f64,
}

impl RobotsPolicy {
    /// Creates a permissive policy: nothing disallowed, no delay
    ///
    /// This is what callers get when robots.txt cannot be fetched or parsed.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks a URL path against the disallowed prefixes
    ///
    /// # Arguments
    ///
    /// * `path` - The URL path to check (e.g., "/page.html")
    ///
    /// # Returns
    ///
    /// * `true` - If no disallowed prefix matches
    /// * `false` - If the policy disallows everything or a prefix matches
    pub fn is_path_allowed(&self, path: &str) -> bool {
        !self
            .disallowed_prefixes
            .iter()
            .any(|prefix| prefix == "/" || path.starts_with(prefix.as_str()))
    }

    /// Returns the requested delay between requests, if any
    pub fn crawl_delay(&self) -> Option<Duration> {
        if self.crawl_delay_secs > 0.0 && self.crawl_delay_secs.is_finite() {
            Some(Duration::from_secs_f64(self.crawl_delay_secs))
        } else {
            None
        }
    }
}

/// Checks if a URL is allowed by a policy
///
/// Only the path takes part in the match; the query string is ignored.
pub fn is_allowed(url: &Url, policy: &RobotsPolicy) -> bool {
    let path = match url.path() {
        "" => "/",
        p => p,
    };
    policy.is_path_allowed(path)
}

/// Parses robots.txt content into the policy that applies to `user_agent`
///
/// # Rules
///
/// - Everything after `#` is a comment; lines without `:` are skipped.
/// - Consecutive `User-agent` lines form one group; each value may hold
///   several space-separated tokens. A group applies to us when a token is
///   `*` or appears, case-insensitively, inside `user_agent`.
/// - `Disallow` values of applying groups are appended in order. An empty
///   value allows everything and adds nothing.
/// - `Crawl-delay` keeps the maximum across applying groups.
///
/// # Examples
///
/// ```
/// use sumi_index::robots::parse_robots;
///
/// let policy = parse_robots("User-agent: *\nDisallow: /private\n", "MyBot/1.0");
/// assert!(!policy.is_path_allowed("/private/x"));
/// assert!(policy.is_path_allowed("/public/x"));
/// ```
pub fn parse_robots(content: &str, user_agent: &str) -> RobotsPolicy {
    let normalized_agent = user_agent.to_lowercase();
    let mut policy = RobotsPolicy::default();

    let mut current_agents: Vec<String> = Vec::new();
    // Set once a rule line follows the User-agent lines of a group
    let mut group_has_rules = false;

    for line in content.lines() {
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        }
        .trim();

        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                if group_has_rules {
                    current_agents.clear();
                    group_has_rules = false;
                }
                current_agents.extend(value.split_whitespace().map(|t| t.to_lowercase()));
            }
            "disallow" => {
                group_has_rules = true;
                if value.is_empty() || !group_applies(&current_agents, &normalized_agent) {
                    continue;
                }
                policy.disallowed_prefixes.push(value.to_string());
            }
            "crawl-delay" => {
                group_has_rules = true;
                if !group_applies(&current_agents, &normalized_agent) {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(delay) if delay.is_finite() && delay >= 0.0 => {
                        policy.crawl_delay_secs = policy.crawl_delay_secs.max(delay);
                    }
                    _ => tracing::debug!(value, "ignoring malformed Crawl-delay"),
                }
            }
            _ => {
                // Allow, Sitemap and friends are not interpreted
                group_has_rules = true;
            }
        }
    }

    policy
}

fn group_applies(agents: &[String], normalized_agent: &str) -> bool {
    agents
        .iter()
        .any(|token| token == "*" || normalized_agent.contains(token.as_str()))
}
