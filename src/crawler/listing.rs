//! Search listing parsing
//!
//! Everything tied to one search engine's markup and request format sits
//! behind `ListingParser`; the walker never looks at selectors.

use crate::fetch::HttpRequest;
use crate::TrawlError;
use crate::url::{resolve, strip_www, unwrap_redirect};
use rand::seq::SliceRandom;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

/// Text-browser user agents; search engines serve these the basic HTML layout
const LYNX_USER_AGENTS: &[&str] = &[
    "Lynx/2.8.9rel.1 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/3.6.13",
    "Lynx/2.8.9dev.16 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/3.5.17",
    "Lynx/2.8.9dev.8 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/3.4.9",
    "Lynx/2.8.8rel.2 libwww-FM/2.14 SSL-MM/1.4.1 OpenSSL/1.0.2k",
    "Lynx/2.9.0dev.10 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/3.7.1",
    "Lynx/2.9.0dev.12 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/3.7.8",
];

/// One raw result block from a listing page
///
/// Link and title are `None` when the block lacked them; such entries
/// still count as "results present" for pagination purposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingEntry {
    /// Link after unwrapping redirect wrappers and percent-decoding
    pub link: Option<String>,
    pub title: Option<String>,
    pub description: String,
}

/// A parsed listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub entries: Vec<ListingEntry>,

    /// Absolute URL of the next listing page
    pub next_page: Option<String>,
}

/// Search-engine specific request shaping and listing parsing
pub trait ListingParser: Send + Sync {
    /// URL of the first listing page for `keyword`
    fn search_url(&self, keyword: &str, results_per_page: usize) -> String;

    /// Builds the request for a listing URL
    fn build_request(&self, url: &str, timeout: Duration) -> HttpRequest {
        HttpRequest::new(url, timeout)
    }

    /// Splits a listing page into entries and the next-page link
    fn parse_listing(&self, html: &str, page_url: &str) -> ListingPage;

    /// True for links that point back into the search engine itself
    fn is_internal(&self, link: &str) -> bool;
}

/// CSS selectors describing a listing layout
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub result_block: String,
    pub link: String,
    pub title: String,
    pub description: String,
    pub next_page: String,
}

/// `ListingParser` driven by a set of CSS selectors
#[derive(Debug, Clone)]
pub struct SelectorListingParser {
    base_url: String,
    internal_marker: String,
    language: String,
    region: String,
    block: Selector,
    link: Selector,
    title: Selector,
    description: Selector,
    next_page: Selector,
}

impl SelectorListingParser {
    /// Compiles the selectors once for every page this parser will see
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorListingParser)` - All selectors compiled
    /// * `Err(TrawlError::Parse)` - A selector is not valid CSS
    pub fn new(
        base_url: &str,
        language: &str,
        region: &str,
        selectors: ListingSelectors,
    ) -> Result<Self, TrawlError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let host = Url::parse(&base_url)
            .ok()
            .and_then(|u| {
                let host = u.host_str()?.to_lowercase();
                Some(match u.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host,
                })
            })
            .unwrap_or_default();

        let compile = |css: &str| {
            Selector::parse(css).map_err(|e| TrawlError::Parse {
                url: base_url.clone(),
                message: format!("invalid listing selector '{}': {:?}", css, e),
            })
        };

        Ok(Self {
            internal_marker: format!("{}/search", strip_www(&host)),
            block: compile(&selectors.result_block)?,
            link: compile(&selectors.link)?,
            title: compile(&selectors.title)?,
            description: compile(&selectors.description)?,
            next_page: compile(&selectors.next_page)?,
            base_url,
            language: language.to_string(),
            region: region.to_string(),
        })
    }

    /// Preset for the basic-HTML layout served to text browsers
    pub fn google_basic(
        base_url: &str,
        language: &str,
        region: &str,
    ) -> Result<Self, TrawlError> {
        Self::new(
            base_url,
            language,
            region,
            ListingSelectors {
                result_block: "div.ezO2md".to_string(),
                link: "a[href]".to_string(),
                title: "a span.CVA68e".to_string(),
                description: "span.FrIlee".to_string(),
                next_page: "a.frGj1b[href]".to_string(),
            },
        )
    }
}

impl ListingParser for SelectorListingParser {
    fn search_url(&self, keyword: &str, results_per_page: usize) -> String {
        format!(
            "{}/search?q={}&num={}&hl={}&gl={}&pws=0",
            self.base_url,
            urlencoding::encode(keyword),
            results_per_page,
            urlencoding::encode(&self.language),
            urlencoding::encode(&self.region)
        )
    }

    fn build_request(&self, url: &str, timeout: Duration) -> HttpRequest {
        let user_agent = LYNX_USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(LYNX_USER_AGENTS[0]);

        HttpRequest::new(url, timeout)
            .header("User-Agent", user_agent)
            .header("Accept", "*/*")
            .cookie("CONSENT", "PENDING+987")
            .cookie("SOCS", "CAESHAgBEhIaAB")
    }

    fn parse_listing(&self, html: &str, _page_url: &str) -> ListingPage {
        let document = Html::parse_document(html);

        let entries = document
            .select(&self.block)
            .map(|b| parse_entry(b, &self.link, &self.title, &self.description))
            .collect();

        let next_page = document
            .select(&self.next_page)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve(&self.base_url, href))
            .filter(|href| !href.is_empty());

        ListingPage { entries, next_page }
    }

    fn is_internal(&self, link: &str) -> bool {
        !self.internal_marker.is_empty() && link.to_lowercase().contains(&self.internal_marker)
    }
}

fn parse_entry(
    block: ElementRef<'_>,
    link: &Selector,
    title: &Selector,
    description: &Selector,
) -> ListingEntry {
    let link = block
        .select(link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| unwrap_redirect(href.trim()))
        .filter(|href| !href.is_empty());

    let title = block
        .select(title)
        .next()
        .map(|span| collapse_text(span.text()))
        .filter(|t| !t.is_empty());

    let description = collapse_text(block.select(description).flat_map(|span| span.text()));

    ListingEntry {
        link,
        title,
        description,
    }
}

fn collapse_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <div class="ezO2md">
            <a href="/url?q=https://www.rust-lang.org/learn&amp;sa=U&amp;ved=abc"><span class="CVA68e">Learn Rust</span></a>
            <span class="FrIlee"><span>Official   docs</span> <b>and</b> books</span>
        </div>
        <div class="ezO2md">
            <a href="/url?q=https://example.com/caf%C3%A9&amp;sa=U"><span class="CVA68e">Café</span></a>
        </div>
        <div class="ezO2md">
            <a href="/search?q=related"><span>no title span</span></a>
        </div>
        <a class="frGj1b" href="/search?q=rust&amp;start=10">Next</a>
        </body></html>"#;

    fn parser() -> SelectorListingParser {
        SelectorListingParser::google_basic("https://www.google.com/", "en", "us").unwrap()
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let selectors = ListingSelectors {
            result_block: "div..broken".to_string(),
            link: "a[href]".to_string(),
            title: "a span".to_string(),
            description: "span".to_string(),
            next_page: "a.next".to_string(),
        };
        let outcome = SelectorListingParser::new("https://search.test", "en", "us", selectors);
        assert!(matches!(outcome, Err(TrawlError::Parse { .. })));
    }

    #[test]
    fn test_search_url() {
        assert_eq!(
            parser().search_url("rust async io", 20),
            "https://www.google.com/search?q=rust%20async%20io&num=20&hl=en&gl=us&pws=0"
        );
    }

    #[test]
    fn test_parse_entries() {
        let page = parser().parse_listing(LISTING, "https://www.google.com/search?q=rust");
        assert_eq!(page.entries.len(), 3);

        let first = &page.entries[0];
        assert_eq!(first.link.as_deref(), Some("https://www.rust-lang.org/learn"));
        assert_eq!(first.title.as_deref(), Some("Learn Rust"));
        assert_eq!(first.description, "Official docs and books");

        assert_eq!(page.entries[1].link.as_deref(), Some("https://example.com/café"));
        assert_eq!(page.entries[1].description, "");

        assert_eq!(page.entries[2].title, None);
    }

    #[test]
    fn test_next_page_resolved_against_base() {
        let page = parser().parse_listing(LISTING, "https://www.google.com/search?q=rust");
        assert_eq!(
            page.next_page.as_deref(),
            Some("https://www.google.com/search?q=rust&start=10")
        );
    }

    #[test]
    fn test_empty_listing() {
        let page = parser().parse_listing("<html><body><p>nothing</p></body></html>", "");
        assert!(page.entries.is_empty());
        assert!(page.next_page.is_none());
    }

    #[test]
    fn test_is_internal() {
        let parser = parser();
        assert!(parser.is_internal("https://www.google.com/search?q=x"));
        assert!(parser.is_internal("https://google.com/search?tbm=isch"));
        assert!(!parser.is_internal("https://example.com/search?q=x"));
        assert!(!parser.is_internal("https://www.rust-lang.org/"));
    }

    #[test]
    fn test_request_shape() {
        let request =
            parser().build_request("https://www.google.com/search?q=a", Duration::from_secs(5));
        let user_agent = request
            .headers
            .iter()
            .find(|(name, _)| name == "User-Agent")
            .map(|(_, value)| value.as_str())
            .unwrap();
        assert!(user_agent.starts_with("Lynx/"));
        assert!(request.headers.contains(&("Accept".to_string(), "*/*".to_string())));
        assert_eq!(
            request.cookie_header().as_deref(),
            Some("CONSENT=PENDING+987; SOCS=CAESHAgBEhIaAB")
        );
        assert_eq!(request.timeout, Duration::from_secs(5));
    }
}
