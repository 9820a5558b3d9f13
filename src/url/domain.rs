use url::Url;

/// Extracts the host from a URL
///
/// The host is returned in lowercase. Returns None for URLs without a host
/// (`mailto:`, `data:` and friends).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use trawl::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Removes a single leading `www.` label from a host
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Returns the `scheme://host[:port]` part of a URL
///
/// Anything that does not parse as an absolute URL with a host yields an
/// empty string.
///
/// # Examples
///
/// ```
/// use trawl::url::base_domain;
///
/// assert_eq!(base_domain("https://news.example.com/a/b?c=d"), "https://news.example.com");
/// assert_eq!(base_domain("http://localhost:8080/x"), "http://localhost:8080");
/// assert_eq!(base_domain("not a url"), "");
/// ```
pub fn base_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };

    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}://{}:{}", parsed.scheme(), host, port),
        (Some(host), None) => format!("{}://{}", parsed.scheme(), host),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_host() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_host_ignores_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_host_none_for_mailto() {
        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert_eq!(extract_host(&url), None);
    }

    #[test]
    fn test_strip_www() {
        assert_eq!(strip_www("www.example.com"), "example.com");
        assert_eq!(strip_www("example.com"), "example.com");
        assert_eq!(strip_www("www2.example.com"), "www2.example.com");
    }

    #[test]
    fn test_base_domain_keeps_scheme() {
        assert_eq!(base_domain("http://example.com/page"), "http://example.com");
        assert_eq!(base_domain("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_base_domain_keeps_explicit_port() {
        assert_eq!(
            base_domain("http://127.0.0.1:4000/a?b=c"),
            "http://127.0.0.1:4000"
        );
    }

    #[test]
    fn test_base_domain_invalid() {
        assert_eq!(base_domain(""), "");
        assert_eq!(base_domain("/relative/path"), "");
    }
}
