use url::Url;

/// Resolves a possibly-relative URL against a base URL
///
/// # Rules
///
/// - Empty input resolves to an empty string
/// - Input that already starts with `http://` or `https://` is returned as-is
/// - Everything else (relative paths, `//host/...`, `?query`, `#fragment`)
///   is joined against `base` using standard URL resolution
/// - If the base cannot be parsed or the join fails, the input is returned
///   unchanged; this function never fails
///
/// # Examples
///
/// ```
/// use trawl::url::resolve;
///
/// let base = "https://example.com/news/story.html";
/// assert_eq!(resolve(base, "img/a.png"), "https://example.com/news/img/a.png");
/// assert_eq!(resolve(base, "/img/a.png"), "https://example.com/img/a.png");
/// assert_eq!(resolve(base, "//cdn.example.com/a.png"), "https://cdn.example.com/a.png");
/// assert_eq!(resolve(base, "https://other.org/x"), "https://other.org/x");
/// assert_eq!(resolve(base, ""), "");
/// ```
pub fn resolve(base: &str, relative: &str) -> String {
    let relative = relative.trim();
    if relative.is_empty() {
        return String::new();
    }

    if has_http_scheme(relative) {
        return relative.to_string();
    }

    match Url::parse(base).and_then(|b| b.join(relative)) {
        Ok(absolute) => absolute.to_string(),
        Err(e) => {
            tracing::trace!("Could not resolve {} against {}: {}", relative, base, e);
            relative.to_string()
        }
    }
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
