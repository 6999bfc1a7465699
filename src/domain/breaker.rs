//! Circuit breaker snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of the execution circuit breaker.
///
/// Mutated only by the worker's state owner; everything else sees copies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub is_open: bool,
    pub consecutive_failures: u32,
    #[serde(default)]
    pub open_reason: Option<String>,
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
}
