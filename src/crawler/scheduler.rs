//! Request scheduling
//!
//! This module handles:
//! - Bounding the number of keywords walked in parallel
//! - Per-host politeness pacing between listing requests
//! - Adapting the per-host delay to slow or failed responses

use crate::config::PolitenessConfig;
use crate::crawler::cancel::CancelHandle;
use crate::state::HostState;
use crate::url::extract_host;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

/// Scheduler shared by every keyword walk of a run
///
/// The scheduler coordinates:
/// - Keyword concurrency (a semaphore with `concurrency` permits)
/// - Per-host request slots, reserved under a lock so concurrent walks
///   hitting the same host queue up behind each other
pub struct Scheduler {
    keyword_slots: Arc<Semaphore>,
    hosts: Mutex<HashMap<String, HostState>>,
    config: PolitenessConfig,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `concurrency` - Maximum number of keywords walked at once
    /// * `config` - Politeness delay bounds
    pub fn new(concurrency: usize, config: PolitenessConfig) -> Self {
        Self {
            keyword_slots: Arc::new(Semaphore::new(concurrency.max(1))),
            hosts: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Waits for a free keyword slot
    ///
    /// Returns `None` if the semaphore was closed.
    pub async fn acquire_keyword_slot(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.keyword_slots).acquire_owned().await.ok()
    }

    pub fn available_keyword_slots(&self) -> usize {
        self.keyword_slots.available_permits()
    }

    /// Waits until a request to `url`'s host is allowed
    ///
    /// Returns false if the run was cancelled while waiting.
    pub async fn wait_for_host(&self, url: &str, cancel: &CancelHandle) -> bool {
        let wait = {
            let mut hosts = self.lock_hosts();
            hosts
                .entry(host_key(url))
                .or_insert_with(|| HostState::new(&self.config))
                .reserve_slot(Instant::now())
        };

        if wait.is_zero() {
            return !cancel.is_cancelled();
        }

        tracing::debug!("Waiting {:?} before requesting {}", wait, url);
        cancel.sleep(wait).await
    }

    /// Records a completed request; slow responses widen the delay
    pub fn record_success(&self, url: &str, latency: Duration) {
        let mut hosts = self.lock_hosts();
        let state = hosts
            .entry(host_key(url))
            .or_insert_with(|| HostState::new(&self.config));
        state.record_success(latency, &self.config);
    }

    /// Records a failed request and widens the delay
    pub fn record_failure(&self, url: &str) {
        let mut hosts = self.lock_hosts();
        let state = hosts
            .entry(host_key(url))
            .or_insert_with(|| HostState::new(&self.config));
        state.record_failure(&self.config);
        tracing::debug!(
            "Politeness delay for {} widened to {:?}",
            host_key(url),
            state.current_delay
        );
    }

    /// Returns a snapshot of a host's pacing state
    pub fn host_state(&self, host: &str) -> Option<HostState> {
        self.lock_hosts().get(host).cloned()
    }

    fn lock_hosts(&self) -> MutexGuard<'_, HashMap<String, HostState>> {
        self.hosts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Politeness is tracked per host; unparseable URLs get their own bucket
fn host_key(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| extract_host(&u))
        .unwrap_or_else(|| url.to_string())
}
