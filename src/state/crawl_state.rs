//! Per-keyword walk state and the run-scoped visited-link set

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Run-scoped set of links already emitted as search results
///
/// The set is owned by the run coordinator and handed to the pagination
/// walker by handle. Cloning shares the same underlying set, so concurrent
/// keywords never emit the same link twice.
#[derive(Debug, Clone, Default)]
pub struct VisitedUrls {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl VisitedUrls {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a link as visited
    ///
    /// Returns true if the link was not seen before. The check and the
    /// insert happen under one lock.
    pub fn insert_if_new(&self, link: &str) -> bool {
        let mut set = self.lock();
        if set.contains(link) {
            return false;
        }
        set.insert(link.to_string())
    }

    /// Returns true if the link was already emitted in this run
    pub fn contains(&self, link: &str) -> bool {
        self.lock().contains(link)
    }

    /// Number of distinct links emitted so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether no link has been emitted yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panic while holding this lock cannot leave the set half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Transient state of one keyword's pagination walk
///
/// Owned and mutated only by the walker for the duration of one keyword.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// The keyword being searched
    pub keyword: String,

    /// Results emitted for this keyword so far
    pub results_count: usize,

    /// Zero-based index of the listing page being processed
    pub current_page: u32,

    /// Listing pages that were fetched successfully
    pub pages_fetched: u32,
}

impl CrawlState {
    /// Creates the state for a keyword that has not been searched yet
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            results_count: 0,
            current_page: 0,
            pages_fetched: 0,
        }
    }

    /// Returns true once the keyword's quota is filled
    pub fn quota_reached(&self, results_per_keyword: usize) -> bool {
        self.results_count >= results_per_keyword
    }

    /// Returns true if another page may be requested under the ceiling
    pub fn has_page_budget(&self, max_pages: u32) -> bool {
        self.current_page + 1 < max_pages
    }

    /// Records an emitted result
    pub fn record_result(&mut self) {
        self.results_count += 1;
    }

    /// Moves on to the next listing page
    pub fn advance_page(&mut self) {
        self.current_page += 1;
    }
}
