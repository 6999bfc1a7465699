//! Connection state-change observers.

use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::application::state::StateHandle;
use crate::domain::{ConnectionState, VenueId};
use crate::error::Result;

/// One transition of a venue connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub venue: VenueId,
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// Receives every state change of a feed client.
///
/// Handlers run synchronously on the feed task and must not block.
pub trait ConnectionObserver: Send + Sync {
    fn on_state_change(&self, change: &StateChange) -> Result<()>;
}

/// Registered observers of one feed client.
///
/// A failing or panicking handler is logged and never affects the feed or
/// the other handlers.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn ConnectionObserver>>,
}

impl ObserverSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn ConnectionObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn with(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.register(observer);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&self, change: &StateChange) {
        for (index, observer) in self.observers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| observer.on_state_change(change))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    venue = %change.venue,
                    observer = index,
                    error = %e,
                    "Connection observer failed"
                ),
                Err(_) => error!(
                    venue = %change.venue,
                    observer = index,
                    "Connection observer panicked"
                ),
            }
        }
    }
}

/// Feeds connection health into the shared circuit breaker.
///
/// Entering `reconnecting` or `error` counts as a failure. Reaching
/// `connected` clears the streak only once no venue is still failing, so one
/// healthy feed cannot close a breaker opened by another.
pub struct BreakerObserver {
    state: StateHandle,
    failing: Mutex<BTreeSet<VenueId>>,
}

impl BreakerObserver {
    #[must_use]
    pub fn new(state: StateHandle) -> Self {
        Self {
            state,
            failing: Mutex::new(BTreeSet::new()),
        }
    }
}

impl ConnectionObserver for BreakerObserver {
    fn on_state_change(&self, change: &StateChange) -> Result<()> {
        match change.to {
            ConnectionState::Reconnecting | ConnectionState::Error => {
                self.failing.lock().insert(change.venue.clone());
                let reason = change.reason.clone().unwrap_or_else(|| change.to.to_string());
                self.state
                    .try_record_failure(format!("{}: {reason}", change.venue))
            }
            ConnectionState::Connected => {
                let mut failing = self.failing.lock();
                failing.remove(&change.venue);
                if failing.is_empty() {
                    self.state.try_record_success()
                } else {
                    debug!(venue = %change.venue, still_failing = failing.len(), "Breaker streak kept");
                    Ok(())
                }
            }
            ConnectionState::Disconnected | ConnectionState::Connecting => Ok(()),
        }
    }
}
