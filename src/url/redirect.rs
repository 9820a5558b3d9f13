use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters that carry the real target of a redirect wrapper
const TARGET_PARAMS: &[&str] = &["q", "url"];

/// Strips a search-engine redirect wrapper from a result link and
/// percent-decodes the target
///
/// Result listings commonly point at `/url?q=<target>&sa=...` instead of the
/// target itself. When `raw` is such a wrapper (relative or absolute), the
/// raw value of the first `q`/`url` parameter is taken; any other link is
/// kept as-is. The outcome is percent-decoded once. Undecodable input is
/// returned without decoding.
///
/// # Examples
///
/// ```
/// use trawl::url::unwrap_redirect;
///
/// assert_eq!(
///     unwrap_redirect("/url?q=https://example.com/a%3Fb%3D1&sa=U&ved=abc"),
///     "https://example.com/a?b=1"
/// );
/// assert_eq!(unwrap_redirect("https://example.com/plain"), "https://example.com/plain");
/// ```
pub fn unwrap_redirect(raw: &str) -> String {
    let raw = raw.trim();
    let target = wrapped_target(raw).unwrap_or(raw);

    match urlencoding::decode(target) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => target.to_string(),
    }
}

/// Returns the undecoded target of a `/url?...` wrapper, if `raw` is one
fn wrapped_target(raw: &str) -> Option<&str> {
    let (path, query) = raw.split_once('?')?;

    let path = if path.starts_with('/') {
        path
    } else {
        // Absolute wrapper: keep only the path part after the authority
        let after_scheme = path.split_once("://")?.1;
        &after_scheme[after_scheme.find('/')?..]
    };

    if path != "/url" {
        return None;
    }

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, value)| TARGET_PARAMS.contains(key) && !value.is_empty())
        .map(|(_, value)| value)
}

/// Parses `link` as an absolute http(s) URL with a host
pub fn parse_http_url(link: &str) -> UrlResult<Url> {
    let url = Url::parse(link).map_err(|e| UrlError::Parse(format!("{}: {}", link, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Returns true if `link` parses as an absolute http(s) URL with a host
pub fn is_http_url(link: &str) -> bool {
    parse_http_url(link).is_ok()
}
