//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: per-keyword pagination progress
//! - `VisitedUrls`: run-scoped set of emitted links, shared across keywords
//! - `HostState`: per-host politeness pacing
//! - `FetchStage` / `StopReason`: fetch-chain stages and walk termination reasons

mod crawl_state;
mod host_state;
mod phase;

// Re-export main types
pub use crawl_state::{CrawlState, VisitedUrls};
pub use host_state::HostState;
pub use phase::{FetchStage, StopReason};
