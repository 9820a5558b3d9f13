//! Scripted stand-ins for the network and the browser

use crate::fetch::{BrowserDriver, BrowserLauncher, HttpRequest, HttpResponse, Transport};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Pops the next scripted item, repeating the last one forever
fn next_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[derive(Default)]
struct TransportState {
    responses: HashMap<String, VecDeque<Result<HttpResponse, FetchError>>>,
    requests: Vec<HttpRequest>,
}

/// Transport answering from per-URL scripts; unscripted URLs get a 404
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<TransportState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.push(
            url,
            Ok(HttpResponse {
                status,
                body: body.to_string(),
                final_url: url.to_string(),
            }),
        );
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.push(
            url,
            Err(FetchError::Transient {
                url: url.to_string(),
                message: message.to_string(),
            }),
        );
    }

    fn push(&self, url: &str, item: Result<HttpResponse, FetchError>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .entry(url.to_string())
            .or_default()
            .push_back(item);
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        let scripted = state
            .responses
            .get_mut(&request.url)
            .and_then(next_sticky);
        scripted.unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 404,
                body: String::new(),
                final_url: request.url.clone(),
            })
        })
    }
}

#[derive(Default)]
struct BrowserState {
    pages: HashMap<String, VecDeque<String>>,
    navigations: Vec<String>,
    launches: usize,
    closes: usize,
}

/// Browser serving scripted page sources; unknown URLs fail to navigate
#[derive(Clone, Default)]
pub struct ScriptedBrowser {
    state: Arc<Mutex<BrowserState>>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, html: &str) {
        self.page_sequence(url, vec![html]);
    }

    /// Successive `page_source` calls on `url` walk through `htmls`
    pub fn page_sequence(&self, url: &str, htmls: Vec<&str>) {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), htmls.into_iter().map(String::from).collect());
    }

    pub fn launcher(&self) -> Arc<dyn BrowserLauncher> {
        Arc::new(self.clone())
    }

    pub fn launch_count(&self) -> usize {
        self.state.lock().unwrap().launches
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedBrowser {
    async fn launch(&self, _headless: bool) -> Result<Box<dyn BrowserDriver>, FetchError> {
        self.state.lock().unwrap().launches += 1;
        Ok(Box::new(ScriptedDriver {
            state: Arc::clone(&self.state),
            current: None,
        }))
    }
}

struct ScriptedDriver {
    state: Arc<Mutex<BrowserState>>,
    current: Option<String>,
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), FetchError> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        if !state.pages.contains_key(url) {
            return Err(FetchError::Browser(format!("navigation to {} failed", url)));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<(), FetchError> {
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, FetchError> {
        let url = self
            .current
            .clone()
            .ok_or_else(|| FetchError::Browser("no page loaded".to_string()))?;
        let mut state = self.state.lock().unwrap();
        state
            .pages
            .get_mut(&url)
            .and_then(next_sticky)
            .ok_or_else(|| FetchError::Browser("no page source".to_string()))
    }

    async fn current_url(&mut self) -> Result<String, FetchError> {
        self.current
            .clone()
            .ok_or_else(|| FetchError::Browser("no page loaded".to_string()))
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}
