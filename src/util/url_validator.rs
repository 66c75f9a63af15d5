use std::net::IpAddr;
use thiserror::Error;
use url::{Host, Url};

/// Errors produced when checking a feed URL before it is probed or stored.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Only http and https feeds can be fetched.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// The URL points to localhost or a private/internal address.
    #[error("Private or local address not allowed: {0}")]
    PrivateAddress(String),
}

/// Validates a user-supplied feed URL.
///
/// Surrounding whitespace is ignored. The scheme must be `http` or `https`
/// and a host must be present. Unless `allow_private` is set, localhost and
/// private/link-local IP literals are rejected (SSRF guard for a store that
/// may be populated from untrusted input).
///
/// # Examples
///
/// ```
/// use feedsift::util::validate_feed_url;
///
/// let url = validate_feed_url("  https://example.com/feed.xml ", false).unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_feed_url("ftp://example.com/feed", false).is_err());
/// assert!(validate_feed_url("http://127.0.0.1/feed", false).is_err());
/// assert!(validate_feed_url("http://127.0.0.1/feed", true).is_ok());
/// ```
pub fn validate_feed_url(input: &str, allow_private: bool) -> Result<Url, UrlValidationError> {
    let url = Url::parse(input.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let host = url.host().ok_or(UrlValidationError::MissingHost)?;
    if allow_private {
        return Ok(url);
    }

    let ip = match host {
        Host::Domain(domain) => {
            if domain.eq_ignore_ascii_case("localhost") || domain.ends_with(".localhost") {
                return Err(UrlValidationError::PrivateAddress(domain.to_owned()));
            }
            None
        }
        Host::Ipv4(v4) => Some(IpAddr::V4(v4)),
        Host::Ipv6(v6) => Some(IpAddr::V6(v6)),
    };

    if let Some(ip) = ip {
        if is_private_ip(&ip) {
            return Err(UrlValidationError::PrivateAddress(ip.to_string()));
        }
    }

    Ok(url)
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (first & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (first & 0xffc0) == 0xfe80
        }
    }
}
