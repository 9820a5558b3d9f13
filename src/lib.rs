//! Trawl: keyword-driven search crawling and article extraction
//!
//! This crate walks paginated search listings for a set of keywords,
//! de-duplicates and filters the discovered links, and extracts a uniform
//! article record from every result through a tiered fetch chain
//! (direct HTTP first, rendered browser second).

pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

#[cfg(test)]
pub(crate) mod test_support;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Trawl operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No keywords to search: {0}")]
    MissingKeywords(String),
}

/// Failures of a single fetch attempt
///
/// None of these escape the crawler or the extractor; they are logged and
/// turned into an early stop or a fallback record.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Transient failure for {url}: {message}")]
    Transient { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Interstitial challenge detected at {url}")]
    ChallengeDetected { url: String },

    #[error("Challenge at {url} not cleared within {waited:?}")]
    ChallengeUnresolved { url: String, waited: Duration },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Returns true for failures a retry might fix
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Trawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, PaginationWalker, RunOutput};
pub use extract::{ContentExtractor, ExtractedContent, Extractor, SearchResult};
pub use url::{base_domain, domain_matches_whitelist, resolve};
