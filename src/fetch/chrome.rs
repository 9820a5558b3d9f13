//! headless_chrome backend for `BrowserDriver`
//!
//! headless_chrome is blocking, so every call runs on the blocking pool.

use crate::fetch::browser::{BrowserDriver, BrowserLauncher};
use crate::FetchError;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::Duration;

/// Chrome stays alive between renders for this long without traffic
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Launches a local Chrome/Chromium
#[derive(Debug, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, headless: bool) -> Result<Box<dyn BrowserDriver>, FetchError> {
        let driver = run_blocking(move || {
            let browser = Browser::new(LaunchOptions {
                headless,
                window_size: Some((1920, 1080)),
                idle_browser_timeout: IDLE_BROWSER_TIMEOUT,
                ..Default::default()
            })?;
            let tab = browser.new_tab()?;
            Ok(ChromeDriver {
                browser: Some(browser),
                tab,
            })
        })
        .await?;
        Ok(Box::new(driver))
    }
}

/// One Chrome process with a single tab
pub struct ChromeDriver {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), FetchError> {
        let tab = Arc::clone(&self.tab);
        let url = url.to_string();
        run_blocking(move || {
            tab.set_default_timeout(timeout);
            tab.navigate_to(&url)?;
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        let tab = Arc::clone(&self.tab);
        let selector = selector.to_string();
        run_blocking(move || {
            tab.wait_for_element_with_custom_timeout(&selector, timeout)?;
            Ok(())
        })
        .await
    }

    async fn page_source(&mut self) -> Result<String, FetchError> {
        let tab = Arc::clone(&self.tab);
        run_blocking(move || tab.get_content()).await
    }

    async fn current_url(&mut self) -> Result<String, FetchError> {
        Ok(self.tab.get_url())
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        let tab = Arc::clone(&self.tab);
        let browser = self.browser.take();
        run_blocking(move || {
            tab.close(true)?;
            drop(browser);
            Ok(())
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, FetchError>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FetchError::Browser(format!("browser task failed: {}", e)))?
        .map_err(|e| FetchError::Browser(e.to_string()))
}
