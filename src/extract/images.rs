//! Image reference normalization
//!
//! Markdown image references and bare image URLs in body text are
//! replaced by `[IMAGE-i]` placeholders pointing into an ordered, de-duplicated
//! list of absolute image URLs.

use crate::url::resolve;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `![alt](path)` or a bare absolute URL ending in an image extension
///
/// Both alternatives live in one pattern so a single left-to-right pass
/// numbers images in textual order. The bare alternative is greedy and
/// backtracks to the last extension in the token; `is_whole_token` then
/// rejects matches that are only a prefix of a longer URL.
static IMAGE_REF: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"!\[[^\]]*\]\(([^)\s]+)[^)]*\)|(?i:https?://[^\s()\[\]]+\.(?:jpe?g|png|gif|webp)(?:[?#][^\s()\[\]]*)?)",
    )
    .ok()
});

/// Sentence punctuation allowed to trail a bare image URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

/// Replaces image references in `content` with `[IMAGE-i]` placeholders
///
/// # Arguments
///
/// * `content` - Body text
/// * `base_url` - Page URL relative image paths are resolved against
///
/// # Returns
///
/// The rewritten text and the image URLs in first-seen order. Repeated
/// references to the same URL share one index. Running the function on
/// its own output changes nothing.
pub fn normalize_image_refs(content: &str, base_url: &str) -> (String, Vec<String>) {
    let mut images: Vec<String> = Vec::new();

    let Some(pattern) = IMAGE_REF.as_ref() else {
        return (content.to_string(), images);
    };

    let rewritten = pattern.replace_all(content, |caps: &Captures<'_>| {
        let Some(whole) = caps.get(0) else {
            return String::new();
        };
        let before = &content[..whole.start()];
        let after = &content[whole.end()..];

        let markdown = caps.get(1);
        if markdown.is_none() && !is_whole_token(after) {
            return whole.as_str().to_string();
        }
        // A placeholder between `!` and `(` would read as a new markdown image
        if before.ends_with('!') && after.starts_with('(') {
            return whole.as_str().to_string();
        }

        let raw = markdown.unwrap_or(whole).as_str();
        let absolute = resolve(base_url, raw);
        if absolute.is_empty() {
            return String::new();
        }

        let index = match images.iter().position(|existing| *existing == absolute) {
            Some(pos) => pos + 1,
            None => {
                images.push(absolute);
                images.len()
            }
        };
        format!("[IMAGE-{}]", index)
    });

    (rewritten.into_owned(), images)
}

/// True if a bare URL match ends its token, up to trailing punctuation
fn is_whole_token(after: &str) -> bool {
    after
        .split(|c: char| c.is_whitespace() || "()[]".contains(c))
        .next()
        .unwrap_or_default()
        .chars()
        .all(|c| TRAILING_PUNCTUATION.contains(&c))
}
