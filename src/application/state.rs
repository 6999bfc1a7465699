//! Single-writer engine state.
//!
//! The price table and the circuit breaker live inside one task. Feed
//! clients, the scanner and the heartbeat publisher reach them only through
//! a cloneable [`StateHandle`], which turns every call into a message on a
//! bounded channel. No lock is ever held across an await.

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::breaker::CircuitBreaker;
use crate::application::cache::PriceTable;
use crate::domain::{CacheSummary, CircuitBreakerState, LivePriceUpdate, PriceKey, PriceView};
use crate::error::{Error, Result};

enum StateCommand {
    UpdatePrice(LivePriceUpdate),
    GetPrice {
        key: PriceKey,
        reply: oneshot::Sender<Option<PriceView>>,
    },
    AllPrices {
        reply: oneshot::Sender<Vec<PriceView>>,
    },
    CacheStats {
        reply: oneshot::Sender<CacheSummary>,
    },
    Breaker {
        reply: oneshot::Sender<CircuitBreakerState>,
    },
    RecordFailure {
        reason: String,
        reply: oneshot::Sender<CircuitBreakerState>,
    },
    RecordSuccess {
        reply: oneshot::Sender<CircuitBreakerState>,
    },
    ResetBreaker {
        reply: oneshot::Sender<CircuitBreakerState>,
    },
}

/// The owning task's state.
struct StateOwner {
    prices: PriceTable,
    breaker: CircuitBreaker,
    rx: mpsc::Receiver<StateCommand>,
}

impl StateOwner {
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.apply(command);
        }
        debug!("State owner stopped: all handles dropped");
    }

    fn apply(&mut self, command: StateCommand) {
        let now = Utc::now();
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            StateCommand::UpdatePrice(update) => self.prices.update(update, now),
            StateCommand::GetPrice { key, reply } => {
                let _ = reply.send(self.prices.get(&key, now));
            }
            StateCommand::AllPrices { reply } => {
                let _ = reply.send(self.prices.all_prices(now));
            }
            StateCommand::CacheStats { reply } => {
                let _ = reply.send(self.prices.stats());
            }
            StateCommand::Breaker { reply } => {
                let _ = reply.send(self.breaker.snapshot());
            }
            StateCommand::RecordFailure { reason, reply } => {
                self.breaker.record_failure(reason, now);
                let _ = reply.send(self.breaker.snapshot());
            }
            StateCommand::RecordSuccess { reply } => {
                self.breaker.record_success();
                let _ = reply.send(self.breaker.snapshot());
            }
            StateCommand::ResetBreaker { reply } => {
                self.breaker.reset();
                let _ = reply.send(self.breaker.snapshot());
            }
        }
    }
}

/// Cloneable handle to the state task.
#[derive(Clone)]
pub struct StateHandle {
    tx: mpsc::Sender<StateCommand>,
}

impl StateHandle {
    /// Spawn the owning task.
    ///
    /// The task exits once every handle has been dropped.
    #[must_use]
    pub fn spawn(failure_threshold: u32, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let owner = StateOwner {
            prices: PriceTable::new(),
            breaker: CircuitBreaker::new(failure_threshold),
            rx,
        };
        let task = tokio::spawn(owner.run());
        (Self { tx }, task)
    }

    /// Queue a price update. Waits only for channel capacity.
    pub async fn update_price(&self, update: LivePriceUpdate) -> Result<()> {
        self.tx
            .send(StateCommand::UpdatePrice(update))
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    pub async fn get_price(&self, key: PriceKey) -> Result<Option<PriceView>> {
        self.request(|reply| StateCommand::GetPrice { key, reply }).await
    }

    /// Momentary snapshot of every cached price with ages computed now.
    pub async fn all_prices(&self) -> Result<Vec<PriceView>> {
        self.request(|reply| StateCommand::AllPrices { reply }).await
    }

    pub async fn cache_stats(&self) -> Result<CacheSummary> {
        self.request(|reply| StateCommand::CacheStats { reply }).await
    }

    pub async fn breaker(&self) -> Result<CircuitBreakerState> {
        self.request(|reply| StateCommand::Breaker { reply }).await
    }

    pub async fn record_failure(&self, reason: impl Into<String>) -> Result<CircuitBreakerState> {
        let reason = reason.into();
        self.request(|reply| StateCommand::RecordFailure { reason, reply })
            .await
    }

    pub async fn record_success(&self) -> Result<CircuitBreakerState> {
        self.request(|reply| StateCommand::RecordSuccess { reply }).await
    }

    pub async fn reset_breaker(&self) -> Result<CircuitBreakerState> {
        self.request(|reply| StateCommand::ResetBreaker { reply }).await
    }

    /// Queue a breaker failure without waiting for the owner.
    ///
    /// For synchronous callers such as connection observers. Fails when the
    /// channel is full or closed.
    pub fn try_record_failure(&self, reason: impl Into<String>) -> Result<()> {
        let (reply, _) = oneshot::channel();
        self.tx
            .try_send(StateCommand::RecordFailure {
                reason: reason.into(),
                reply,
            })
            .map_err(|_| Error::ChannelClosed)
    }

    /// Non-waiting counterpart of [`StateHandle::record_success`].
    pub fn try_record_success(&self) -> Result<()> {
        let (reply, _) = oneshot::channel();
        self.tx
            .try_send(StateCommand::RecordSuccess { reply })
            .map_err(|_| Error::ChannelClosed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> StateCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| Error::ChannelClosed)?;
        rx.await.map_err(|_| Error::ChannelClosed)
    }
}
