use crate::config::{BrowserConfig, FetchConfig};
use crate::fetch::browser::{BrowserSession, RenderOptions};
use crate::fetch::transport::{HttpRequest, Transport};
use crate::state::FetchStage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Page content returned by one stage of the chain
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// URL the content was served from
    pub url: String,
    pub body: String,

    /// Stage that produced the content
    pub via: FetchStage,
}

/// Result of walking the chain with an acceptance check
#[derive(Debug, PartialEq)]
pub enum ChainOutcome<T> {
    Accepted(T),

    /// Pages were fetched but every one was turned down
    Rejected,

    /// No stage returned a page
    Unavailable,
}

/// Ordered fetch strategies for article pages
///
/// Direct HTTP first, then the shared browser session. Every stage
/// returns `None` on failure; nothing is raised past the chain.
#[derive(Clone)]
pub struct FetchChain {
    transport: Arc<dyn Transport>,
    browser: Option<Arc<BrowserSession>>,
    timeout: Duration,
    render: RenderOptions,
}

impl FetchChain {
    /// Creates a chain
    ///
    /// # Arguments
    ///
    /// * `transport` - Used for the direct stage
    /// * `browser` - Shared session for the rendered stage, `None` disables it
    /// * `fetch` - Direct fetch timeout
    /// * `browser_config` - Render timeouts and settle delay
    pub fn new(
        transport: Arc<dyn Transport>,
        browser: Option<Arc<BrowserSession>>,
        fetch: &FetchConfig,
        browser_config: &BrowserConfig,
    ) -> Self {
        Self {
            transport,
            browser,
            timeout: fetch.article_timeout(),
            render: RenderOptions::from_config(browser_config),
        }
    }

    pub fn has_browser(&self) -> bool {
        self.browser.is_some()
    }

    /// Fetches with a plain GET
    ///
    /// Returns `None` on network errors, timeouts, non-2xx statuses and
    /// empty bodies.
    pub async fn fetch_direct(&self, url: &str) -> Option<FetchedPage> {
        let request = HttpRequest::new(url, self.timeout)
            .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8");

        match self.transport.get(&request).await {
            Ok(response) if response.is_success() && !response.body.trim().is_empty() => {
                Some(FetchedPage {
                    url: response.final_url,
                    body: response.body,
                    via: FetchStage::Direct,
                })
            }
            Ok(response) => {
                debug!("Direct fetch of {} returned HTTP {}", url, response.status);
                None
            }
            Err(e) => {
                debug!("Direct fetch of {} failed: {}", url, e);
                None
            }
        }
    }

    /// Fetches through the shared browser session
    pub async fn fetch_rendered(&self, url: &str) -> Option<FetchedPage> {
        let browser = self.browser.as_ref()?;
        match browser.render(url, &self.render).await {
            Ok(page) => Some(FetchedPage {
                url: page.final_url,
                body: page.html,
                via: FetchStage::Rendered,
            }),
            Err(e) => {
                warn!("Rendered fetch of {} failed: {}", url, e);
                None
            }
        }
    }

    /// Runs a single stage
    pub async fn fetch_stage(&self, stage: FetchStage, url: &str) -> Option<FetchedPage> {
        match stage {
            FetchStage::Direct => self.fetch_direct(url).await,
            FetchStage::Rendered => self.fetch_rendered(url).await,
            FetchStage::Exhausted => None,
        }
    }

    /// Walks the stages until `accept` takes a fetched page
    ///
    /// A page `accept` turns down does not end the walk; the next stage
    /// is still tried.
    pub async fn fetch_with<T, F>(&self, url: &str, mut accept: F) -> ChainOutcome<T>
    where
        F: FnMut(&FetchedPage) -> Option<T> + Send,
        T: Send,
    {
        let mut stage = FetchStage::Direct;
        let mut fetched = false;

        while !stage.is_terminal() {
            if let Some(page) = self.fetch_stage(stage, url).await {
                fetched = true;
                if let Some(value) = accept(&page) {
                    return ChainOutcome::Accepted(value);
                }
                debug!("Page from {} via {} turned down", url, page.via);
            }
            stage = stage.next();
        }

        if fetched {
            ChainOutcome::Rejected
        } else {
            ChainOutcome::Unavailable
        }
    }

    /// Closes the browser session if this chain owns one
    pub async fn close(&self) {
        if let Some(browser) = &self.browser {
            browser.close().await;
        }
    }
}
