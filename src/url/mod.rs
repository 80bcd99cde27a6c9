//! URL handling module for Sumi-Index
//!
//! This module provides the URL safety validator (scheme allow-list, SSRF
//! protection, media skipping) and small helpers for user-submitted URLs.

mod address;
mod media;
mod validator;

// Re-export main functions
pub use address::is_blocked_ip;
pub use media::is_media_path;
pub use validator::UrlValidator;

/// Prefixes `http://` to user input that carries no scheme
///
/// Input is trimmed first. Anything that already contains `://` is
/// returned unchanged, even if the scheme is not one we crawl; the
/// validator rejects it later.
///
/// # Examples
///
/// ```
/// use sumi_index::url::with_default_scheme;
///
/// assert_eq!(with_default_scheme("example.com/a"), "http://example.com/a");
/// assert_eq!(with_default_scheme(" https://example.com "), "https://example.com");
/// ```
pub fn with_default_scheme(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Returns the key a user-supplied URL is stored under
///
/// The scheme is defaulted and the result normalized the way crawled
/// records are (lower-cased host, explicit root path). Input that does not
/// parse is returned trimmed.
///
/// # Examples
///
/// ```
/// use sumi_index::url::canonical_key;
///
/// assert_eq!(canonical_key("Example.COM"), "http://example.com/");
/// ```
pub fn canonical_key(input: &str) -> String {
    let with_scheme = with_default_scheme(input);
    match ::url::Url::parse(&with_scheme) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => input.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheme_added() {
        assert_eq!(with_default_scheme("example.com"), "http://example.com");
    }

    #[test]
    fn test_existing_scheme_kept() {
        assert_eq!(
            with_default_scheme("https://example.com/x"),
            "https://example.com/x"
        );
        assert_eq!(with_default_scheme("ftp://example.com"), "ftp://example.com");
    }

    #[test]
    fn test_canonical_key_normalizes() {
        assert_eq!(
            canonical_key(" https://Example.com/a?b=1 "),
            "https://example.com/a?b=1"
        );
        assert_eq!(canonical_key("example.com"), "http://example.com/");
    }

    #[test]
    fn test_canonical_key_unparseable() {
        assert_eq!(canonical_key(" http://[::1 "), "http://[::1");
    }
}
