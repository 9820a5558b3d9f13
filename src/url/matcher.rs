use crate::url::domain::{extract_host, strip_www};
use url::Url;

/// Checks whether a host belongs to a whitelist entry
///
/// A host matches when it equals the entry or is a strict subdomain of it
/// (`*.entry`). Both sides are expected in lowercase.
///
/// # Examples
///
/// ```
/// use trawl::url::host_matches_entry;
///
/// assert!(host_matches_entry("example.com", "example.com"));
/// assert!(host_matches_entry("blog.example.com", "example.com"));
/// assert!(!host_matches_entry("notexample.com", "example.com"));
/// ```
pub fn host_matches_entry(host: &str, entry: &str) -> bool {
    if entry.is_empty() {
        return false;
    }
    host == entry
        || (host.len() > entry.len()
            && host.ends_with(entry)
            && host.as_bytes()[host.len() - entry.len() - 1] == b'.')
}

/// Returns true if the URL's host is covered by the whitelist
///
/// A leading `www.` is stripped from the host before comparison. Whitelist
/// entries are compared case-insensitively, ignoring surrounding whitespace
/// and their own `www.` prefix. A URL that cannot be parsed never matches,
/// so malformed input is not silently suppressed.
///
/// # Examples
///
/// ```
/// use trawl::url::domain_matches_whitelist;
///
/// let whitelist = vec!["example.com".to_string()];
/// assert!(domain_matches_whitelist("https://www.example.com/x", &whitelist));
/// assert!(domain_matches_whitelist("https://sub.example.com/x", &whitelist));
/// assert!(!domain_matches_whitelist("https://notexample.com/x", &whitelist));
/// ```
pub fn domain_matches_whitelist(url: &str, whitelist: &[String]) -> bool {
    if whitelist.is_empty() {
        return false;
    }

    let Some(host) = Url::parse(url).ok().as_ref().and_then(extract_host) else {
        return false;
    };
    let host = strip_www(&host);

    whitelist.iter().any(|entry| {
        let entry = entry.trim().to_lowercase();
        host_matches_entry(host, strip_www(&entry))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_host_matches() {
        assert!(domain_matches_whitelist(
            "https://example.com/page",
            &whitelist(&["example.com"])
        ));
    }

    #[test]
    fn test_subdomain_matches() {
        let list = whitelist(&["example.com"]);
        assert!(domain_matches_whitelist("https://sub.example.com/x", &list));
        assert!(domain_matches_whitelist("https://a.b.example.com/x", &list));
    }

    #[test]
    fn test_suffix_without_dot_does_not_match() {
        let list = whitelist(&["example.com"]);
        assert!(!domain_matches_whitelist("https://notexample.com/x", &list));
        assert!(!domain_matches_whitelist("https://example.com.evil.org/x", &list));
    }

    #[test]
    fn test_www_prefix_is_stripped() {
        let list = whitelist(&["example.com"]);
        assert!(domain_matches_whitelist("https://www.example.com/", &list));

        let list = whitelist(&["www.example.com"]);
        assert!(domain_matches_whitelist("https://example.com/", &list));
    }

    #[test]
    fn test_entries_are_case_insensitive() {
        let list = whitelist(&["  Example.COM "]);
        assert!(domain_matches_whitelist("https://EXAMPLE.com/", &list));
    }

    #[test]
    fn test_port_is_ignored() {
        let list = whitelist(&["example.com"]);
        assert!(domain_matches_whitelist("http://example.com:8080/", &list));
    }

    #[test]
    fn test_malformed_url_never_matches() {
        let list = whitelist(&["example.com"]);
        assert!(!domain_matches_whitelist("not a url", &list));
        assert!(!domain_matches_whitelist("", &list));
        assert!(!domain_matches_whitelist("/relative/example.com", &list));
    }

    #[test]
    fn test_empty_whitelist() {
        assert!(!domain_matches_whitelist("https://example.com/", &[]));
    }

    #[test]
    fn test_empty_entry_is_ignored() {
        let list = whitelist(&["", "   "]);
        assert!(!domain_matches_whitelist("https://example.com/", &list));
    }

    #[test]
    fn test_host_matches_entry() {
        assert!(host_matches_entry("co.uk", "co.uk"));
        assert!(host_matches_entry("example.co.uk", "co.uk"));
        assert!(!host_matches_entry("co.uk", "example.co.uk"));
        assert!(!host_matches_entry("myexample.com", "example.com"));
    }
}
