use crate::config::PolitenessConfig;
use std::time::{Duration, Instant};

/// Tracks politeness pacing for one host
///
/// The delay between two requests to the same host starts at the configured
/// start delay, doubles after a failed or slow response and shrinks by a
/// fixed step after every fast success, always staying within the
/// configured bounds.
#[derive(Debug, Clone)]
pub struct HostState {
    /// Number of requests made to this host in the current run
    pub request_count: u32,

    /// Earliest instant at which the next request may start
    pub next_allowed: Option<Instant>,

    /// Current delay between two requests to this host
    pub current_delay: Duration,

    /// Failures (or slow responses) in a row
    pub consecutive_failures: u32,
}

impl HostState {
    /// Creates a new HostState with the configured start delay
    pub fn new(config: &PolitenessConfig) -> Self {
        Self {
            request_count: 0,
            next_allowed: None,
            current_delay: config.start_delay(),
            consecutive_failures: 0,
        }
    }

    /// Reserves the next request slot for this host
    ///
    /// Returns how long the caller has to wait before sending its request.
    /// The slot is taken immediately, so a second caller reserving right
    /// after is scheduled one delay later.
    pub fn reserve_slot(&mut self, now: Instant) -> Duration {
        let start = match self.next_allowed {
            Some(next) if next > now => next,
            _ => now,
        };
        self.next_allowed = Some(start + self.current_delay);
        self.request_count += 1;
        start - now
    }

    /// Records a response; slow responses count as failures
    pub fn record_success(&mut self, latency: Duration, config: &PolitenessConfig) {
        if latency >= config.slow_response() {
            self.record_failure(config);
            return;
        }

        self.consecutive_failures = 0;
        self.current_delay = self
            .current_delay
            .saturating_sub(config.decrease_step())
            .max(config.min_delay());
    }

    /// Records a failed request and widens the delay
    pub fn record_failure(&mut self, config: &PolitenessConfig) {
        self.consecutive_failures += 1;
        self.current_delay = (self.current_delay * 2)
            .max(config.min_delay())
            .min(config.max_delay());
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        match self.next_allowed {
            Some(next) if next > now => Some(next - now),
            _ => None,
        }
    }
}
