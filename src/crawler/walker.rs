//! Per-keyword pagination walk
//!
//! Page n+1's URL is only known once page n is parsed, so pages of one
//! keyword are fetched strictly in order; parallelism exists only across
//! keywords.

use crate::config::Config;
use crate::crawler::cancel::CancelHandle;
use crate::crawler::listing::{ListingEntry, ListingParser};
use crate::crawler::scheduler::Scheduler;
use crate::extract::SearchResult;
use crate::fetch::{
    get_with_retry, is_challenge_page, BrowserSession, RenderOptions, RetryPolicy, Transport,
};
use crate::state::{CrawlState, StopReason, VisitedUrls};
use crate::url::{domain_matches_whitelist, is_http_url};
use crate::FetchError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Outcome of one keyword's walk
#[derive(Debug, Clone)]
pub struct KeywordReport {
    pub keyword: String,

    /// Results in emission order
    pub results: Vec<SearchResult>,

    /// Listing pages fetched successfully
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
}

impl KeywordReport {
    /// Report for a keyword that was never started
    pub fn cancelled(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            results: Vec::new(),
            pages_fetched: 0,
            stop_reason: StopReason::Cancelled,
        }
    }
}

/// Walks listing pages for one keyword at a time
///
/// Shared by every keyword task of a run: the visited set, whitelist,
/// scheduler and browser session are common to all walks.
pub struct PaginationWalker {
    transport: Arc<dyn Transport>,
    parser: Arc<dyn ListingParser>,
    browser: Option<Arc<BrowserSession>>,
    render: RenderOptions,
    scheduler: Arc<Scheduler>,
    retry: RetryPolicy,
    visited: VisitedUrls,
    whitelist: Arc<Vec<String>>,
    cancel: CancelHandle,
    results_per_keyword: usize,
    max_pages: u32,
    request_timeout: Duration,
}

impl PaginationWalker {
    /// Creates a walker without a browser
    ///
    /// # Arguments
    ///
    /// * `config` - Quota, page ceiling, retry and politeness settings
    /// * `transport` - Used for listing requests
    /// * `parser` - Listing markup and request format
    /// * `visited` - Run-scoped set of emitted links
    /// * `whitelist` - Domains whose results are skipped
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        parser: Arc<dyn ListingParser>,
        visited: VisitedUrls,
        whitelist: Vec<String>,
    ) -> Self {
        Self {
            transport,
            parser,
            browser: None,
            render: RenderOptions::from_config(&config.browser).with_challenge(&config.browser),
            scheduler: Arc::new(Scheduler::new(
                config.search.concurrency,
                config.politeness.clone(),
            )),
            retry: RetryPolicy::from_config(&config.fetch),
            visited,
            whitelist: Arc::new(whitelist),
            cancel: CancelHandle::new(),
            results_per_keyword: config.search.results_per_keyword,
            max_pages: config.search.max_pages,
            request_timeout: config.fetch.request_timeout(),
        }
    }

    /// Enables escalation of failed pages to the rendered browser
    pub fn with_browser(mut self, browser: Arc<BrowserSession>) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    pub fn browser(&self) -> Option<&Arc<BrowserSession>> {
        self.browser.as_ref()
    }

    pub fn visited(&self) -> &VisitedUrls {
        &self.visited
    }

    /// Walks the listing pages of `keyword`
    ///
    /// Results are emitted in listing order. When `sink` is given every
    /// result is also sent there as soon as it is accepted. Never fails:
    /// problems end the walk with the matching `StopReason`.
    pub async fn walk_keyword(
        &self,
        keyword: &str,
        sink: Option<&mpsc::Sender<SearchResult>>,
    ) -> KeywordReport {
        let mut state = CrawlState::new(keyword);
        let mut results = Vec::new();
        let mut url = self.parser.search_url(keyword, self.results_per_keyword);

        info!("Starting search for '{}'", keyword);

        let stop_reason = loop {
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let page_number = state.current_page + 1;
            info!("Processing page {} for keyword: '{}'", page_number, keyword);

            let html = match self.fetch_listing(keyword, page_number, &url).await {
                Ok(html) => html,
                Err(FetchError::Cancelled) => break StopReason::Cancelled,
                Err(e) => {
                    error!(
                        "Giving up on page {} for '{}': {}",
                        page_number, keyword, e
                    );
                    break StopReason::PageFailed;
                }
            };
            state.pages_fetched += 1;

            let page = self.parser.parse_listing(&html, &url);
            info!(
                "Found {} raw results on page {} for '{}'",
                page.entries.len(),
                page_number,
                keyword
            );
            if page.entries.is_empty() {
                break StopReason::NoMoreResults;
            }

            let mut accepted = 0;
            for entry in page.entries {
                if state.quota_reached(self.results_per_keyword) {
                    break;
                }
                let Some(result) = self.accept(keyword, entry) else {
                    continue;
                };
                state.record_result();
                accepted += 1;
                if let Some(sink) = sink {
                    if sink.send(result.clone()).await.is_err() {
                        debug!("Result consumer closed; keeping '{}' results locally", keyword);
                    }
                }
                results.push(result);
            }
            info!(
                "Extracted {} valid results from page {} for '{}' ({}/{})",
                accepted, page_number, keyword, state.results_count, self.results_per_keyword
            );

            if state.quota_reached(self.results_per_keyword) {
                break StopReason::QuotaReached;
            }
            if !state.has_page_budget(self.max_pages) {
                break StopReason::PageCeiling;
            }
            match page.next_page {
                Some(next) => {
                    url = next;
                    state.advance_page();
                }
                None => break StopReason::NoNextPage,
            }
        };

        match stop_reason {
            StopReason::QuotaReached => info!(
                "Reached target of {} results for '{}'",
                self.results_per_keyword, keyword
            ),
            StopReason::PageCeiling => warn!(
                "Reached max page limit ({} pages) for '{}' with only {} results",
                self.max_pages, keyword, state.results_count
            ),
            StopReason::NoMoreResults => warn!(
                "No more results found for '{}' after {} results",
                keyword, state.results_count
            ),
            StopReason::NoNextPage => warn!(
                "No next page for '{}' after {} results",
                keyword, state.results_count
            ),
            StopReason::PageFailed | StopReason::Cancelled => warn!(
                "Stopped '{}' ({}) after {} results",
                keyword, stop_reason, state.results_count
            ),
        }

        KeywordReport {
            keyword: keyword.to_string(),
            results,
            pages_fetched: state.pages_fetched,
            stop_reason,
        }
    }

    /// Applies the validity filters and claims the link in the visited set
    fn accept(&self, keyword: &str, entry: ListingEntry) -> Option<SearchResult> {
        let (Some(link), Some(title)) = (entry.link, entry.title) else {
            return None;
        };

        if !is_http_url(&link) || self.parser.is_internal(&link) {
            trace!("Skipping non-result link {}", link);
            return None;
        }
        if domain_matches_whitelist(&link, &self.whitelist) {
            debug!("Skipping whitelisted {}", link);
            return None;
        }
        if !self.visited.insert_if_new(&link) {
            trace!("Skipping already seen {}", link);
            return None;
        }

        Some(SearchResult {
            keyword: keyword.to_string(),
            title,
            link,
            description: entry.description,
        })
    }

    /// Fetches one listing page: direct with retries, then at most one
    /// rendered attempt
    async fn fetch_listing(
        &self,
        keyword: &str,
        page_number: u32,
        url: &str,
    ) -> Result<String, FetchError> {
        if !self.scheduler.wait_for_host(url, &self.cancel).await {
            return Err(FetchError::Cancelled);
        }

        let request = self.parser.build_request(url, self.request_timeout);
        let started = Instant::now();

        let direct_error = match get_with_retry(self.transport.as_ref(), &request, &self.retry).await
        {
            Ok(response) if !is_challenge_page(&response.body, &response.final_url) => {
                self.scheduler.record_success(url, started.elapsed());
                return Ok(response.body);
            }
            Ok(_) => FetchError::ChallengeDetected {
                url: url.to_string(),
            },
            Err(e) => e,
        };

        self.scheduler.record_failure(url);
        warn!(
            "Request failed for '{}' on page {} after retries: {}",
            keyword, page_number, direct_error
        );

        let Some(browser) = &self.browser else {
            return Err(direct_error);
        };
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        info!(
            "Switching to rendered browser for '{}' page {}",
            keyword, page_number
        );
        browser.render(url, &self.render).await.map(|page| page.html)
    }
}
