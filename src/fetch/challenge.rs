//! Interstitial challenge detection
//!
//! A challenge page is recognized by structure, never by the response
//! status alone: search engines serve their "unusual traffic" pages with a
//! 200 as often as with a 429.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static CHALLENGE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "form[action^='/sorry']",
        "input#captcha",
        "img[src*='captcha']",
        "div.g-recaptcha",
        "iframe[src*='recaptcha']",
        "textarea#g-recaptcha-response",
    ]
    .iter()
    .filter_map(|s| Selector::parse(s).ok())
    .collect()
});

static DIV_SELECTOR: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("div").ok());

/// Returns true if the page is an interstitial challenge
///
/// # Arguments
///
/// * `html` - The page markup
/// * `url` - The URL the page was served from, after redirects
pub fn is_challenge_page(html: &str, url: &str) -> bool {
    if is_challenge_url(url) {
        return true;
    }

    let document = Html::parse_document(html);
    if CHALLENGE_SELECTORS
        .iter()
        .any(|selector| document.select(selector).next().is_some())
    {
        return true;
    }

    match DIV_SELECTOR.as_ref() {
        Some(div) => document.select(div).any(div_mentions_captcha),
        None => false,
    }
}

/// Challenge redirects land on a `/sorry/...` path
fn is_challenge_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| parsed.path().starts_with("/sorry"))
        .unwrap_or(false)
}

/// Checks the div's own text nodes, not its descendants'
fn div_mentions_captcha(div: ElementRef<'_>) -> bool {
    div.children()
        .filter_map(|child| child.value().as_text())
        .any(|text| text.to_lowercase().contains("captcha"))
}
