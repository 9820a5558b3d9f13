//! Fetching: HTTP transport, retry policy, rendered browser and the
//! direct-then-rendered fetch chain

mod browser;
mod chain;
mod challenge;
#[cfg(feature = "chrome")]
mod chrome;
mod retry;
mod transport;

pub use browser::{
    BrowserDriver, BrowserLauncher, BrowserSession, ChallengePolicy, RenderOptions, RenderedPage,
    UnavailableLauncher,
};
pub use chain::{ChainOutcome, FetchChain, FetchedPage};
pub use challenge::is_challenge_page;
#[cfg(feature = "chrome")]
pub use chrome::{ChromeDriver, ChromeLauncher};
pub use retry::{get_with_retry, RetryPolicy};
pub use transport::{
    build_http_client, HttpRequest, HttpResponse, ReqwestTransport, Transport, DEFAULT_USER_AGENT,
};
