//! Crawler module for search listing walks
//!
//! This module contains the crawl logic, including:
//! - Listing parsing and search request shaping
//! - Per-keyword pagination with quota, page ceiling and escalation
//! - Keyword concurrency and per-host politeness
//! - Run coordination and cooperative cancellation

mod cancel;
mod coordinator;
mod listing;
mod scheduler;
mod walker;

pub use cancel::CancelHandle;
pub use coordinator::{Coordinator, RunOutput};
pub use listing::{ListingEntry, ListingPage, ListingParser, ListingSelectors, SelectorListingParser};
pub use scheduler::Scheduler;
pub use walker::{KeywordReport, PaginationWalker};
