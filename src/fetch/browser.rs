//! Rendered-browser fetching
//!
//! The browser itself is an injected capability: `BrowserLauncher` creates
//! a `BrowserDriver`, and `BrowserSession` owns the one driver a run keeps
//! alive. Every render holds the session lock from navigation to page
//! source, so at most one caller drives the browser at a time.

use crate::config::BrowserConfig;
use crate::fetch::challenge::is_challenge_page;
use crate::FetchError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One open browser page
#[async_trait]
pub trait BrowserDriver: Send {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), FetchError>;

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> Result<(), FetchError>;

    async fn page_source(&mut self) -> Result<String, FetchError>;

    async fn current_url(&mut self) -> Result<String, FetchError>;

    async fn close(&mut self) -> Result<(), FetchError>;
}

/// Starts browsers
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, headless: bool) -> Result<Box<dyn BrowserDriver>, FetchError>;
}

/// Launcher used when the binary was built without a browser backend
#[derive(Debug, Default)]
pub struct UnavailableLauncher;

#[async_trait]
impl BrowserLauncher for UnavailableLauncher {
    async fn launch(&self, _headless: bool) -> Result<Box<dyn BrowserDriver>, FetchError> {
        Err(FetchError::Browser(
            "no browser backend compiled in (enable the `chrome` feature)".to_string(),
        ))
    }
}

/// How long to wait on a challenge page for it to be cleared
#[derive(Debug, Clone, Copy)]
pub struct ChallengePolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

/// Per-render settings
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub page_load_timeout: Duration,

    /// Selector that must appear before the page counts as loaded
    pub root_selector: String,
    pub wait_timeout: Duration,

    /// Pause after the root element appeared
    pub settle_delay: Duration,

    /// `None` skips challenge detection
    pub challenge: Option<ChallengePolicy>,
}

impl RenderOptions {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            page_load_timeout: config.page_load_timeout(),
            root_selector: "body".to_string(),
            wait_timeout: config.wait_timeout(),
            settle_delay: config.settle_delay(),
            challenge: None,
        }
    }

    /// Same options, waiting out challenge pages per the config
    pub fn with_challenge(mut self, config: &BrowserConfig) -> Self {
        self.challenge = Some(ChallengePolicy {
            timeout: config.challenge_timeout(),
            poll_interval: config.challenge_poll(),
        });
        self
    }
}

/// Markup and final URL of a rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub final_url: String,
}

/// The run's shared browser
///
/// The driver is launched on first use and reused by every later render
/// until `close` is called. Closing is idempotent; a render after close
/// launches a fresh driver.
pub struct BrowserSession {
    launcher: Arc<dyn BrowserLauncher>,
    headless: bool,
    driver: Mutex<Option<Box<dyn BrowserDriver>>>,
}

impl BrowserSession {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, headless: bool) -> Self {
        Self {
            launcher,
            headless,
            driver: Mutex::new(None),
        }
    }

    /// Returns true while a driver is running
    pub async fn is_active(&self) -> bool {
        self.driver.lock().await.is_some()
    }

    /// Navigates to `url` and returns the rendered markup
    ///
    /// # Arguments
    ///
    /// * `url` - Page to render
    /// * `options` - Timeouts, settle delay and challenge handling
    ///
    /// # Returns
    ///
    /// * `Ok(RenderedPage)` - The page after the root element appeared and
    ///   the settle delay elapsed
    /// * `Err(FetchError::ChallengeUnresolved)` - A challenge was still
    ///   present when the challenge timeout ran out
    /// * `Err(FetchError::Browser)` - Launch, navigation or wait failure
    pub async fn render(
        &self,
        url: &str,
        options: &RenderOptions,
    ) -> Result<RenderedPage, FetchError> {
        let mut guard = self.driver.lock().await;

        if guard.is_none() {
            info!("Launching browser (headless: {})", self.headless);
            *guard = Some(self.launcher.launch(self.headless).await?);
        }
        let driver = match guard.as_mut() {
            Some(driver) => driver,
            None => return Err(FetchError::Browser("browser not running".to_string())),
        };

        debug!("Rendering {}", url);
        driver.navigate(url, options.page_load_timeout).await?;
        driver
            .wait_for_selector(&options.root_selector, options.wait_timeout)
            .await?;
        tokio::time::sleep(options.settle_delay).await;

        let mut page = snapshot(driver, url).await?;

        if let Some(policy) = options.challenge {
            if is_challenge_page(&page.html, &page.final_url) {
                warn!(
                    "Challenge at {}, waiting up to {:?} for it to be cleared",
                    url, policy.timeout
                );
                page = wait_out_challenge(driver, url, policy).await?;
                tokio::time::sleep(options.settle_delay).await;
                page = snapshot(driver, &page.final_url).await?;
            }
        }

        Ok(page)
    }

    /// Shuts the browser down if it is running
    pub async fn close(&self) {
        let driver = self.driver.lock().await.take();
        if let Some(mut driver) = driver {
            match driver.close().await {
                Ok(()) => info!("Browser closed"),
                Err(e) => warn!("Error closing browser: {}", e),
            }
        }
    }
}

async fn snapshot(
    driver: &mut Box<dyn BrowserDriver>,
    url: &str,
) -> Result<RenderedPage, FetchError> {
    let html = driver.page_source().await?;
    let final_url = driver
        .current_url()
        .await
        .unwrap_or_else(|_| url.to_string());
    Ok(RenderedPage { html, final_url })
}

async fn wait_out_challenge(
    driver: &mut Box<dyn BrowserDriver>,
    url: &str,
    policy: ChallengePolicy,
) -> Result<RenderedPage, FetchError> {
    let started = Instant::now();

    while started.elapsed() < policy.timeout {
        tokio::time::sleep(policy.poll_interval).await;
        let page = snapshot(driver, url).await?;
        if !is_challenge_page(&page.html, &page.final_url) {
            info!("Challenge at {} cleared after {:?}", url, started.elapsed());
            return Ok(page);
        }
    }

    Err(FetchError::ChallengeUnresolved {
        url: url.to_string(),
        waited: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBrowser;

    fn options() -> RenderOptions {
        RenderOptions {
            page_load_timeout: Duration::from_secs(1),
            root_selector: "body".to_string(),
            wait_timeout: Duration::from_secs(1),
            settle_delay: Duration::ZERO,
            challenge: None,
        }
    }

    const CHALLENGE: &str = r#"<html><body><div class="g-recaptcha"></div></body></html>"#;

    #[tokio::test]
    async fn test_render_launches_once_and_reuses_driver() {
        let browser = ScriptedBrowser::new();
        browser.page("https://a.test/1", "<html><body>one</body></html>");
        browser.page("https://a.test/2", "<html><body>two</body></html>");
        let session = BrowserSession::new(browser.launcher(), true);

        let first = session.render("https://a.test/1", &options()).await.unwrap();
        let second = session.render("https://a.test/2", &options()).await.unwrap();

        assert!(first.html.contains("one"));
        assert!(second.html.contains("two"));
        assert_eq!(browser.launch_count(), 1);
        assert!(session.is_active().await);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let browser = ScriptedBrowser::new();
        browser.page("https://a.test/", "<html><body>a</body></html>");
        let session = BrowserSession::new(browser.launcher(), true);

        session.render("https://a.test/", &options()).await.unwrap();
        session.close().await;
        session.close().await;

        assert!(!session.is_active().await);
        assert_eq!(browser.close_count(), 1);
    }

    #[tokio::test]
    async fn test_navigation_failure_is_an_error() {
        let browser = ScriptedBrowser::new();
        let session = BrowserSession::new(browser.launcher(), true);

        let result = session.render("https://unknown.test/", &options()).await;
        assert!(matches!(result, Err(FetchError::Browser(_))));
    }

    #[tokio::test]
    async fn test_unavailable_launcher() {
        let session = BrowserSession::new(Arc::new(UnavailableLauncher), true);
        let result = session.render("https://a.test/", &options()).await;
        assert!(matches!(result, Err(FetchError::Browser(_))));
        assert!(!session.is_active().await);
    }

    #[tokio::test]
    async fn test_challenge_cleared_while_polling() {
        let browser = ScriptedBrowser::new();
        browser.page_sequence(
            "https://search.test/",
            vec![CHALLENGE, CHALLENGE, "<html><body>results</body></html>"],
        );
        let session = BrowserSession::new(browser.launcher(), false);

        let mut opts = options();
        opts.challenge = Some(ChallengePolicy {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1),
        });

        let page = session.render("https://search.test/", &opts).await.unwrap();
        assert!(page.html.contains("results"));
    }

    #[tokio::test]
    async fn test_challenge_unresolved_after_timeout() {
        let browser = ScriptedBrowser::new();
        browser.page("https://search.test/", CHALLENGE);
        let session = BrowserSession::new(browser.launcher(), false);

        let mut opts = options();
        opts.challenge = Some(ChallengePolicy {
            timeout: Duration::from_millis(20),
            poll_interval: Duration::from_millis(5),
        });

        let result = session.render("https://search.test/", &opts).await;
        assert!(matches!(result, Err(FetchError::ChallengeUnresolved { .. })));
    }

    #[tokio::test]
    async fn test_challenge_ignored_without_policy() {
        let browser = ScriptedBrowser::new();
        browser.page("https://news.test/", CHALLENGE);
        let session = BrowserSession::new(browser.launcher(), true);

        let page = session.render("https://news.test/", &options()).await.unwrap();
        assert!(page.html.contains("g-recaptcha"));
    }
}
