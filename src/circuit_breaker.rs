//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for recipe sources.
//! When a source keeps failing, its breaker opens and searches skip that
//! source (it contributes an empty result) until the reset timeout passes.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::BreakerConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Circuit breaker guarding one recipe source
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold reached, requests are skipped
/// - **Half-Open**: Reset timeout elapsed, the next request is let through
///
/// # Configuration
///
/// Uses `BreakerConfig` for:
/// - `failure_threshold`: Consecutive failures before opening (default: 5)
/// - `reset_secs`: Time before attempting a request again (default: 60s)
#[derive(Debug)]
pub struct CircuitBreaker {
    source: &'static str,
    state: Mutex<BreakerState>,
    config: BreakerConfig,
}

impl CircuitBreaker {
    /// Create a closed circuit breaker for the named source
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recipe_finder::config::BreakerConfig;
    /// use recipe_finder::circuit_breaker::CircuitBreaker;
    ///
    /// let breaker = CircuitBreaker::new("mealdb", BreakerConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(source: &'static str, config: BreakerConfig) -> Self {
        Self {
            source,
            state: Mutex::new(BreakerState::default()),
            config,
        }
    }

    /// Check if the breaker is open (requests should be skipped)
    ///
    /// Returns `true` while the failure count is at or above the threshold and
    /// the reset timeout has not elapsed. Once it has, the count is cleared and
    /// the breaker lets the next request through.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.failure_count >= self.config.failure_threshold {
            if let Some(last_time) = state.last_failure {
                if last_time.elapsed() < Duration::from_secs(self.config.reset_secs) {
                    return true;
                }
                info!("Circuit breaker for {} half-open, retrying source", self.source);
                state.failure_count = 0;
                state.last_failure = None;
            }
        }
        false
    }

    /// Record a failed request
    pub fn record_failure(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.failure_count += 1;
        state.last_failure = Some(Instant::now());

        if state.failure_count == self.config.failure_threshold {
            warn!(
                "Circuit breaker for {} opened after {} consecutive failures",
                self.source, state.failure_count
            );
        }
    }

    /// Record a successful request, closing the breaker
    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.failure_count = 0;
        state.last_failure = None;
    }

    /// Current consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .failure_count
    }
}
