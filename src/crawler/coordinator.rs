//! Run coordinator - wires keywords, whitelist, walker and extractor
//!
//! This module contains the run loop that:
//! - Spawns one walk per keyword, bounded by the keyword semaphore
//! - Streams every accepted result to a single extraction consumer
//! - Enforces the optional run timeout through cooperative cancellation
//! - Collects per-keyword reports and extracted records for the sink

use crate::config::Config;
use crate::crawler::cancel::CancelHandle;
use crate::crawler::listing::SelectorListingParser;
use crate::crawler::walker::{KeywordReport, PaginationWalker};
use crate::extract::{
    ContentExtractor, ExtractedContent, Extractor, HtmlArticleParser, SearchResult,
    EXTRACTION_CANCELLED,
};
use crate::fetch::{
    BrowserLauncher, BrowserSession, FetchChain, ReqwestTransport, Transport, UnavailableLauncher,
};
use crate::state::VisitedUrls;
use crate::{ConfigError, TrawlError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Results buffered between the walkers and the extraction consumer
const RESULT_CHANNEL_CAPACITY: usize = 256;

/// Everything a run produced
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// One report per keyword, in input order
    pub reports: Vec<KeywordReport>,

    /// One record per search result, in consumption order; empty when
    /// extraction is disabled
    pub extracted: Vec<ExtractedContent>,

    /// True if the run was cancelled or timed out
    pub cancelled: bool,
}

impl RunOutput {
    /// All search results, grouped by keyword in input order
    pub fn results(&self) -> impl Iterator<Item = &SearchResult> {
        self.reports.iter().flat_map(|report| report.results.iter())
    }

    pub fn total_results(&self) -> usize {
        self.reports.iter().map(|report| report.results.len()).sum()
    }
}

/// Main run coordinator structure
pub struct Coordinator {
    walker: Arc<PaginationWalker>,
    extractor: Option<Arc<dyn Extractor>>,
    cancel: CancelHandle,
    run_timeout: Option<Duration>,
}

impl Coordinator {
    /// Creates a coordinator around a walker and an optional extractor
    ///
    /// The walker's cancel handle becomes the run's cancel handle.
    pub fn new(walker: PaginationWalker, extractor: Option<Arc<dyn Extractor>>) -> Self {
        let cancel = walker.cancel_handle().clone();
        Self {
            walker: Arc::new(walker),
            extractor,
            cancel,
            run_timeout: None,
        }
    }

    /// Cancels the run once `timeout` has elapsed
    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Builds the production pipeline from configuration
    ///
    /// Uses reqwest for direct fetches, the basic-HTML listing parser and
    /// the generic article parser. One browser session is shared by the
    /// walker's escalation path and the extractor.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `whitelist` - Domains whose results are skipped
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(TrawlError)` - The HTTP client or the listing parser could not be built
    pub fn from_config(config: &Config, whitelist: Vec<String>) -> Result<Self, TrawlError> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::with_default_client()?);
        let parser = Arc::new(SelectorListingParser::google_basic(
            &config.search.base_url,
            &config.search.language,
            &config.search.region,
        )?);

        let browser = browser_session(config);

        let mut walker = PaginationWalker::new(
            config,
            Arc::clone(&transport),
            parser,
            VisitedUrls::new(),
            whitelist,
        );
        if let Some(browser) = &browser {
            walker = walker.with_browser(Arc::clone(browser));
        }

        let extractor: Option<Arc<dyn Extractor>> = if config.output.extract_content {
            let chain = FetchChain::new(transport, browser, &config.fetch, &config.browser);
            Some(Arc::new(ContentExtractor::new(
                chain,
                Arc::new(HtmlArticleParser::new()),
            )))
        } else {
            None
        };

        Ok(Self::new(walker, extractor).with_run_timeout(config.search.run_timeout()))
    }

    /// Handle for cancelling the run from outside (e.g. Ctrl-C)
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs every keyword and extracts every result
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutput)` - Reports and records; a cancelled run still
    ///   returns whatever was collected
    /// * `Err(TrawlError::Config)` - `keywords` is empty
    pub async fn run(&self, keywords: &[String]) -> Result<RunOutput, TrawlError> {
        if keywords.is_empty() {
            tracing::error!("No keywords to search, aborting run");
            return Err(ConfigError::MissingKeywords("keyword list is empty".to_string()).into());
        }

        tracing::info!(
            "Starting run: {} keywords, extraction {}",
            keywords.len(),
            if self.extractor.is_some() { "enabled" } else { "disabled" }
        );

        let timeout_task = self.run_timeout.map(|timeout| {
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                if cancel.sleep(timeout).await {
                    tracing::warn!("Run timeout of {:?} reached, cancelling", timeout);
                    cancel.cancel("run timeout");
                }
            })
        });

        let (sender, consumer) = match &self.extractor {
            Some(extractor) => {
                let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
                let consumer = tokio::spawn(consume_results(
                    Arc::clone(extractor),
                    rx,
                    self.cancel.clone(),
                ));
                (Some(tx), Some(consumer))
            }
            None => (None, None),
        };

        let mut tasks = JoinSet::new();
        for (index, keyword) in keywords.iter().enumerate() {
            let walker = Arc::clone(&self.walker);
            let sender = sender.clone();
            let keyword = keyword.clone();
            tasks.spawn(async move {
                let _permit = walker.scheduler().acquire_keyword_slot().await;
                if walker.cancel_handle().is_cancelled() {
                    return (index, KeywordReport::cancelled(keyword));
                }
                let report = walker.walk_keyword(&keyword, sender.as_ref()).await;
                (index, report)
            });
        }
        drop(sender);

        let mut reports: Vec<Option<KeywordReport>> = vec![None; keywords.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => reports[index] = Some(report),
                Err(e) => tracing::error!("Keyword task failed: {}", e),
            }
        }

        let extracted = match consumer {
            Some(handle) => match handle.await {
                Ok(records) => records,
                Err(e) => {
                    tracing::error!("Extraction consumer failed: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if let Some(task) = timeout_task {
            task.abort();
        }

        let output = RunOutput {
            reports: reports.into_iter().flatten().collect(),
            extracted,
            cancelled: self.cancel.is_cancelled(),
        };

        tracing::info!(
            "Run finished: {} results, {} records{}",
            output.total_results(),
            output.extracted.len(),
            if output.cancelled { " (cancelled)" } else { "" }
        );

        Ok(output)
    }

    /// Releases the browser session
    pub async fn shutdown(&self) {
        if let Some(extractor) = &self.extractor {
            extractor.close().await;
        }
        if let Some(browser) = self.walker.browser() {
            browser.close().await;
        }
    }
}

fn browser_session(config: &Config) -> Option<Arc<BrowserSession>> {
    if !config.browser.enabled {
        return None;
    }

    let launcher: Arc<dyn BrowserLauncher> = if cfg!(feature = "chrome") {
        default_launcher()
    } else {
        tracing::warn!("Rendered fallback requested but no browser backend is compiled in");
        Arc::new(UnavailableLauncher)
    };
    Some(Arc::new(BrowserSession::new(launcher, config.browser.headless)))
}

#[cfg(feature = "chrome")]
fn default_launcher() -> Arc<dyn BrowserLauncher> {
    Arc::new(crate::fetch::ChromeLauncher)
}

#[cfg(not(feature = "chrome"))]
fn default_launcher() -> Arc<dyn BrowserLauncher> {
    Arc::new(UnavailableLauncher)
}

/// Extracts every result sent by the walkers
///
/// Results still queued after cancellation get a fallback record instead
/// of an extraction, so the record count always matches the result count.
async fn consume_results(
    extractor: Arc<dyn Extractor>,
    mut results: mpsc::Receiver<SearchResult>,
    cancel: CancelHandle,
) -> Vec<ExtractedContent> {
    let mut records = Vec::new();
    while let Some(result) = results.recv().await {
        let record = if cancel.is_cancelled() {
            ExtractedContent::fallback(&result, EXTRACTION_CANCELLED)
        } else {
            extractor.extract(&result).await
        };
        records.push(record);
    }
    records
}
