//! Validation and canonical form of target URLs.

use url::Url;

/// Longest target URL accepted for shortening.
pub const MAX_URL_LENGTH: usize = 2048;

/// Errors that can occur while accepting a target URL.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,

    #[error("URL is longer than {MAX_URL_LENGTH} characters")]
    TooLong,
}

/// Checks that `input` is an absolute http(s) URL with a host and returns its
/// canonical form.
///
/// Canonicalization lowercases the host, drops the fragment and removes the
/// scheme's default port. Path and query are kept as written.
///
/// ```ignore
/// assert_eq!(
///     normalize_url("HTTPS://Example.COM:443/Path#top").unwrap(),
///     "https://example.com/Path"
/// );
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let input = input.trim();
    if input.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong);
    }

    let mut url =
        Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    // `Url` already lowercases domain hosts and strips default ports when parsing.
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlNormalizationError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_form() {
        let cases = [
            ("http://example.com", "http://example.com/"),
            ("https://EXAMPLE.COM/Path", "https://example.com/Path"),
            ("http://example.com:80/a", "http://example.com/a"),
            ("https://example.com:443/a", "https://example.com/a"),
            ("http://example.com:8080/a", "http://example.com:8080/a"),
            ("https://example.com/p?q=Rust#frag", "https://example.com/p?q=Rust"),
            ("  https://example.com/trim  ", "https://example.com/trim"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_url(input).unwrap(), expected, "input: {input}");
        }
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        for input in [
            "ftp://example.com/file.txt",
            "javascript:alert('xss')",
            "mailto:test@example.com",
            "file:///etc/passwd",
        ] {
            assert_eq!(
                normalize_url(input),
                Err(UrlNormalizationError::UnsupportedProtocol),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_rejects_relative_and_garbage() {
        assert!(matches!(
            normalize_url("example.com"),
            Err(UrlNormalizationError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_url(""),
            Err(UrlNormalizationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_too_long() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(normalize_url(&url), Err(UrlNormalizationError::TooLong));
    }
}
