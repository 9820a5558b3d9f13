use std::path::Path;
use tracing::{debug, warn};

/// Loads the keyword list, one keyword per line
///
/// A missing or unreadable file yields an empty list and a warning; the
/// caller decides whether an empty keyword list is fatal.
pub fn load_keywords(path: &Path) -> Vec<String> {
    let keywords = load_lines(path, "keyword");
    debug!("Loaded {} keywords from {}", keywords.len(), path.display());
    keywords
}

/// Loads the whitelist, one domain per line
///
/// Entries are lowercased. A missing file yields an empty whitelist.
pub fn load_whitelist(path: &Path) -> Vec<String> {
    let entries: Vec<String> = load_lines(path, "whitelist")
        .into_iter()
        .map(|entry| entry.to_lowercase())
        .collect();
    debug!(
        "Loaded {} whitelist entries from {}",
        entries.len(),
        path.display()
    );
    entries
}

fn load_lines(path: &Path, kind: &str) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_lines(&content),
        Err(e) => {
            warn!("Could not read {} file {}: {}", kind, path.display(), e);
            Vec::new()
        }
    }
}

/// Trims lines, skipping blanks and `#` comments
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
