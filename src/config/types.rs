use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Trawl
///
/// Every section is optional; missing sections and keys take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    pub politeness: PolitenessConfig,
    pub browser: BrowserConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// Search crawl behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Stop paginating a keyword once this many results were emitted
    pub results_per_keyword: usize,

    /// Never request more listing pages than this per keyword
    pub max_pages: u32,

    /// Maximum number of keywords walked in parallel
    pub concurrency: usize,

    /// Interface language requested from the search engine (`hl`)
    pub language: String,

    /// Result region requested from the search engine (`gl`)
    pub region: String,

    /// Scheme and host of the search engine
    pub base_url: String,

    /// Wall-clock limit for the whole run in seconds (0 = unlimited)
    pub run_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_per_keyword: 20,
            max_pages: 10,
            concurrency: 1,
            language: "en".to_string(),
            region: "us".to_string(),
            base_url: "https://www.google.com".to_string(),
            run_timeout_secs: 0,
        }
    }
}

impl SearchConfig {
    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }
}

/// HTTP transport and retry behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Timeout for one listing request in seconds
    pub request_timeout_secs: u64,

    /// Retries after the first attempt of a listing request
    pub retry_times: u32,

    /// Response statuses that trigger a retry
    pub retry_http_codes: Vec<u16>,

    /// Pause between two attempts in milliseconds
    pub retry_delay_ms: u64,

    /// Timeout for a direct article fetch in seconds
    pub article_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            retry_times: 1,
            retry_http_codes: vec![500, 502, 503, 504, 403, 408, 429],
            retry_delay_ms: 1000,
            article_timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn article_timeout(&self) -> Duration {
        Duration::from_secs(self.article_timeout_secs)
    }
}

/// Per-host request pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolitenessConfig {
    /// Initial delay between requests to the same host (milliseconds)
    pub start_delay_ms: u64,

    /// Lower bound for the adaptive delay (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound for the adaptive delay (milliseconds)
    pub max_delay_ms: u64,

    /// Responses slower than this widen the delay (milliseconds)
    pub slow_response_ms: u64,

    /// Amount the delay shrinks after a fast success (milliseconds)
    pub decrease_step_ms: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 2000,
            min_delay_ms: 500,
            max_delay_ms: 10_000,
            slow_response_ms: 5000,
            decrease_step_ms: 250,
        }
    }
}

impl PolitenessConfig {
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn slow_response(&self) -> Duration {
        Duration::from_millis(self.slow_response_ms)
    }

    pub fn decrease_step(&self) -> Duration {
        Duration::from_millis(self.decrease_step_ms)
    }
}

/// Rendered-browser fallback
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Whether the rendered fallback may be used at all
    pub enabled: bool,

    /// Run the browser without a visible window
    pub headless: bool,

    /// Navigation timeout in seconds
    pub page_load_timeout_secs: u64,

    /// How long to wait for the page's root element in seconds
    pub wait_timeout_secs: u64,

    /// Pause after the root element appeared, for deferred content (milliseconds)
    pub settle_delay_ms: u64,

    /// How long to wait for an interstitial challenge to be cleared (seconds)
    pub challenge_timeout_secs: u64,

    /// Polling interval while waiting on a challenge (milliseconds)
    pub challenge_poll_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            headless: true,
            page_load_timeout_secs: 30,
            wait_timeout_secs: 10,
            settle_delay_ms: 2000,
            challenge_timeout_secs: 300,
            challenge_poll_ms: 5000,
        }
    }
}

impl BrowserConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn challenge_timeout(&self) -> Duration {
        Duration::from_secs(self.challenge_timeout_secs)
    }

    pub fn challenge_poll(&self) -> Duration {
        Duration::from_millis(self.challenge_poll_ms)
    }
}

/// Keyword and whitelist files
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InputConfig {
    /// One keyword per line
    pub keywords_path: String,

    /// One domain per line; results on these domains are skipped
    pub whitelist_path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keywords_path: "keywords.txt".to_string(),
            whitelist_path: "whitelist.txt".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Run the content extractor on every search result
    pub extract_content: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./trawl.db".to_string(),
            extract_content: true,
        }
    }
}
