use crate::extract::article::ArticleParser;
use crate::extract::images::normalize_image_refs;
use crate::extract::types::{ArticleFields, ExtractedContent, ExtractionStatus, SearchResult};
use crate::fetch::{ChainOutcome, FetchChain, FetchedPage};
use crate::url::resolve;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Content when no fetch stage returned the page
pub const CONTENT_UNAVAILABLE: &str = "content unavailable: direct and rendered fetch both failed";

/// Content when pages were fetched but none had a usable body
pub const EXTRACTION_FAILED: &str = "extraction failed: no usable body in fetched page";

/// Content for results still queued when the run was cancelled
pub const EXTRACTION_CANCELLED: &str = "extraction skipped: run cancelled";

/// Turns a search result into an article record
///
/// Implementations are total: every call returns exactly one record,
/// degrading to `ExtractedContent::fallback` instead of failing.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, result: &SearchResult) -> ExtractedContent;

    /// Releases any resources held across calls
    async fn close(&self) {}
}

/// Extractor walking the fetch chain and parsing with an `ArticleParser`
///
/// If a stage fetches a page without a usable body the next stage is
/// still tried, since rendered markup often holds what the raw response
/// lacked.
#[derive(Clone)]
pub struct ContentExtractor {
    chain: FetchChain,
    parser: Arc<dyn ArticleParser>,
}

impl ContentExtractor {
    pub fn new(chain: FetchChain, parser: Arc<dyn ArticleParser>) -> Self {
        Self { chain, parser }
    }

    fn build_record(
        &self,
        result: &SearchResult,
        page: &FetchedPage,
        fields: ArticleFields,
    ) -> ExtractedContent {
        let body = fields.body.unwrap_or_default();
        let (content, images) = normalize_image_refs(&body, &page.url);

        let main_image = fields
            .main_image
            .map(|image| resolve(&page.url, &image))
            .unwrap_or_default();

        ExtractedContent {
            title: non_empty_or(fields.title, &result.title),
            url: result.link.clone(),
            description: non_empty_or(fields.description, &result.description),
            content,
            date: fields.date.unwrap_or_default(),
            main_image,
            images,
            author: fields.author.unwrap_or_default(),
            site: fields.site_name.unwrap_or_default(),
            keyword: result.keyword.clone(),
            status: ExtractionStatus::Extracted,
        }
    }
}

#[async_trait]
impl Extractor for ContentExtractor {
    async fn extract(&self, result: &SearchResult) -> ExtractedContent {
        let outcome = self
            .chain
            .fetch_with(&result.link, |page| {
                let fields = self.parser.parse_article(&page.body, &page.url);
                if !fields.has_body() {
                    debug!("No usable body in {} via {}", result.link, page.via);
                    return None;
                }
                debug!("Extracted {} via {}", result.link, page.via);
                Some(self.build_record(result, page, fields))
            })
            .await;

        let message = match outcome {
            ChainOutcome::Accepted(record) => return record,
            ChainOutcome::Rejected => EXTRACTION_FAILED,
            ChainOutcome::Unavailable => CONTENT_UNAVAILABLE,
        };
        warn!("Fallback record for {} [{}]: {}", result.link, result.keyword, message);
        ExtractedContent::fallback(result, message)
    }

    async fn close(&self) {
        if self.chain.has_browser() {
            info!("Closing extractor browser session");
        }
        self.chain.close().await;
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
