//! Article parsing
//!
//! Turns page markup into `ArticleFields`. The pipeline only sees the
//! `ArticleParser` trait, so a site-specific parser can replace the generic
//! one without touching the extractor.

use crate::extract::types::ArticleFields;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extracts article fields from a page
pub trait ArticleParser: Send + Sync {
    /// # Arguments
    ///
    /// * `html` - Page markup
    /// * `page_url` - URL the markup was served from
    fn parse_article(&self, html: &str, page_url: &str) -> ArticleFields;
}

/// Containers tried for the body, most specific first
const CONTENT_CONTAINERS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    ".article-body",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".story-body",
    "#content",
    ".content",
    "body",
];

/// Elements whose subtree never contributes body text
const SKIPPED_ELEMENTS: &[&str] = &[
    "nav", "header", "footer", "aside", "script", "style", "form", "noscript", "iframe", "svg",
    "button", "template",
];

/// Elements emitted as one body line each
const TEXT_BLOCKS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre", "figcaption", "dd", "dt",
];

/// Generic metadata-and-container article parser
#[derive(Debug, Clone, Default)]
pub struct HtmlArticleParser;

impl HtmlArticleParser {
    pub fn new() -> Self {
        Self
    }
}

impl ArticleParser for HtmlArticleParser {
    fn parse_article(&self, html: &str, page_url: &str) -> ArticleFields {
        let document = Html::parse_document(html);

        let title = meta_content(&document, "meta[property='og:title']")
            .or_else(|| first_text(&document, "title"))
            .or_else(|| first_text(&document, "h1"));

        let description = meta_content(&document, "meta[name='description']")
            .or_else(|| meta_content(&document, "meta[property='og:description']"));

        let date = meta_content(&document, "meta[property='article:published_time']")
            .or_else(|| first_attr(&document, "time[datetime]", "datetime"))
            .or_else(|| meta_content(&document, "meta[name='date']"));

        let author = meta_content(&document, "meta[name='author']")
            .or_else(|| meta_content(&document, "meta[itemprop='author']"))
            .or_else(|| first_text(&document, "[itemprop='author']"))
            .or_else(|| first_text(&document, ".author, .byline"));

        let site_name = meta_content(&document, "meta[property='og:site_name']").or_else(|| {
            Url::parse(page_url)
                .ok()
                .and_then(|u| u.host_str().map(String::from))
        });

        let main_image = meta_content(&document, "meta[property='og:image']")
            .or_else(|| meta_content(&document, "meta[name='twitter:image']"))
            .or_else(|| meta_content(&document, "meta[property='twitter:image']"));

        ArticleFields {
            title,
            description,
            body: extract_body(&document),
            date,
            author,
            site_name,
            main_image,
        }
    }
}

/// Collects the body of the first container that has any text block
fn extract_body(document: &Html) -> Option<String> {
    for container in CONTENT_CONTAINERS {
        let Ok(selector) = Selector::parse(container) else {
            continue;
        };
        for element in document.select(&selector) {
            let mut lines = Vec::new();
            collect_blocks(element, &mut lines);
            if lines.iter().any(|line| !line.starts_with("![")) {
                return Some(lines.join("\n"));
            }
        }
    }
    None
}

fn collect_blocks(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();

        if SKIPPED_ELEMENTS.contains(&name) {
            continue;
        }

        if name == "img" {
            if let Some(line) = image_line(child) {
                lines.push(line);
            }
        } else if TEXT_BLOCKS.contains(&name) {
            let text = if name == "pre" {
                child.text().collect::<String>().trim().to_string()
            } else {
                collapse_whitespace(&child.text().collect::<String>())
            };
            if !text.is_empty() {
                lines.push(text);
            }
            collect_images(child, lines);
        } else {
            collect_blocks(child, lines);
        }
    }
}

fn collect_images(element: ElementRef<'_>, lines: &mut Vec<String>) {
    if let Ok(selector) = Selector::parse("img") {
        lines.extend(element.select(&selector).filter_map(image_line));
    }
}

fn image_line(img: ElementRef<'_>) -> Option<String> {
    let src = img
        .value()
        .attr("src")
        .or_else(|| img.value().attr("data-src"))
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with("data:"))?;
    let alt = collapse_whitespace(img.value().attr("alt").unwrap_or_default());
    Some(format!("![{}]({})", alt.replace(['[', ']'], ""), src))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    first_attr(document, selector, "content")
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|text| !text.is_empty())
}
