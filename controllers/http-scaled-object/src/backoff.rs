//! # Fibonacci Backoff
//!
//! Requeue delays for failed reconciliations. Each delay is the sum of the
//! previous two, starting at `min` and capped at `max`; with the defaults
//! that is 1m, 1m, 2m, 3m, 5m, 8m, 10m, 10m, ...
//!
//! `BackoffTable` keeps one sequence per HTTPScaledObject key so a failing
//! object slows down without affecting healthy ones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// First delay of the default sequence
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(60);
/// Cap of the default sequence
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(600);

/// Fibonacci delay sequence
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min: Duration,
    max: Duration,
    prev: Duration,
    current: Duration,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            prev: Duration::ZERO,
            current: min,
        }
    }

    /// Returns the current delay and advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let next = self.prev.saturating_add(self.current);
        self.prev = self.current;
        self.current = next.min(self.max);
        delay
    }

    /// Restarts the sequence from `min`.
    pub fn reset(&mut self) {
        self.prev = Duration::ZERO;
        self.current = self.min;
    }
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BACKOFF, DEFAULT_MAX_BACKOFF)
    }
}

#[derive(Debug, Clone, Default)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

/// Per-object backoff sequences, keyed by `namespace/name`
#[derive(Debug, Clone, Default)]
pub struct BackoffTable {
    states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl BackoffTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed reconciliation and returns the delay before the
    /// next attempt together with the consecutive failure count.
    pub fn record_failure(&self, key: &str) -> (Duration, u32) {
        match self.states.lock() {
            Ok(mut states) => {
                let state = states.entry(key.to_string()).or_default();
                state.error_count += 1;
                (state.backoff.next_delay(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using default backoff", e);
                (DEFAULT_MIN_BACKOFF, 0)
            }
        }
    }

    /// Forgets the failure history of `key` after a successful reconciliation.
    pub fn record_success(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            if let Some(state) = states.get_mut(key) {
                state.error_count = 0;
                state.backoff.reset();
            }
        }
    }

    /// Consecutive failures recorded for `key`
    #[cfg(test)]
    pub fn error_count(&self, key: &str) -> u32 {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(key).map(|s| s.error_count))
            .unwrap_or(0)
    }
}
