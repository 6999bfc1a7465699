//! Execution circuit breaker.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::CircuitBreakerState;

/// Tracks consecutive failures and halts execution once they exceed a
/// threshold.
///
/// Closed → open when `consecutive_failures > threshold`.
/// Open → closed on [`CircuitBreaker::reset`] or [`CircuitBreaker::record_success`].
/// Detection keeps running while open; only execution is gated.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    threshold: u32,
    state: CircuitBreakerState,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            state: CircuitBreakerState::default(),
        }
    }

    /// Record a failure. Returns true if this failure opened the breaker.
    pub fn record_failure(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> bool {
        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
        if self.state.is_open || self.state.consecutive_failures <= self.threshold {
            return false;
        }

        let reason = reason.into();
        warn!(
            failures = self.state.consecutive_failures,
            threshold = self.threshold,
            reason = %reason,
            "Circuit breaker opened"
        );
        self.state.is_open = true;
        self.state.open_reason = Some(reason);
        self.state.opened_at = Some(now);
        true
    }

    /// Record a healthy signal, clearing the failure streak.
    /// Returns true if this closed an open breaker.
    pub fn record_success(&mut self) -> bool {
        let was_open = self.state.is_open;
        self.state = CircuitBreakerState::default();
        if was_open {
            info!("Circuit breaker closed after successful health signal");
        }
        was_open
    }

    /// Manual reset.
    pub fn reset(&mut self) {
        if self.state.is_open {
            info!("Circuit breaker manually reset");
        }
        self.state = CircuitBreakerState::default();
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.state.is_open
    }

    #[must_use]
    pub fn snapshot(&self) -> CircuitBreakerState {
        self.state.clone()
    }
}
