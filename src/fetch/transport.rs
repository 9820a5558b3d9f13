//! HTTP transport
//!
//! The crawler and the extractor only talk to the network through the
//! `Transport` trait so that tests can substitute a scripted transport.

use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// User agent for direct article fetches
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// A single GET request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            cookies: Vec::new(),
            timeout,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Renders the cookies as a single `Cookie` header value
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// A response with its body already read
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,

    /// URL after redirects
    pub final_url: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends GET requests
///
/// Non-success statuses are returned as responses, not errors, so retry
/// policies can look at them. Errors are reserved for requests that never
/// produced a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// `Transport` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a transport with the default client settings
    pub fn with_default_client() -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client()?))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookies) = request.cookie_header() {
            builder = builder.header(reqwest::header::COOKIE, cookies);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(&request.url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(&request.url, e))?;

        Ok(HttpResponse {
            status,
            body,
            final_url,
        })
    }
}

/// Builds the HTTP client shared by all direct fetches
///
/// Redirects are followed (article links often bounce through a few
/// hops); per-request timeouts are set on each request.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    };
    FetchError::Transient {
        url: url.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client().is_ok());
    }

    #[test]
    fn test_cookie_header() {
        let request = HttpRequest::new("https://example.com", Duration::from_secs(1))
            .cookie("CONSENT", "PENDING+987")
            .cookie("SOCS", "CAESHAgBEhIaAB");
        assert_eq!(
            request.cookie_header().as_deref(),
            Some("CONSENT=PENDING+987; SOCS=CAESHAgBEhIaAB")
        );
    }

    #[test]
    fn test_no_cookie_header_without_cookies() {
        let request = HttpRequest::new("https://example.com", Duration::from_secs(1));
        assert!(request.cookie_header().is_none());
    }

    #[test]
    fn test_response_success_range() {
        let mut response = HttpResponse {
            status: 200,
            body: String::new(),
            final_url: String::new(),
        };
        assert!(response.is_success());
        response.status = 302;
        assert!(!response.is_success());
        response.status = 503;
        assert!(!response.is_success());
    }
}
