//! Background heartbeat writer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::feed::FeedHandle;
use crate::application::state::StateHandle;
use crate::domain::heartbeat::HEARTBEAT_VERSION;
use crate::domain::{ShutdownInfo, WorkerHeartbeat, WorkerState};
use crate::error::{Result, StorageError};
use crate::port::outbound::store::KvStore;

/// Publishes a [`WorkerHeartbeat`] under one key, overwriting it each cycle.
///
/// Writes are best-effort: a failed or timed-out cycle is logged and the
/// next tick tries again.
pub struct HeartbeatPublisher {
    store: Arc<dyn KvStore>,
    key: String,
    state: StateHandle,
    feeds: Vec<FeedHandle>,
    interval: Duration,
    write_timeout: Duration,
    started_at: DateTime<Utc>,
    pid: u32,
    tick: u64,
}

impl HeartbeatPublisher {
    pub fn new(
        store: Arc<dyn KvStore>,
        key: impl Into<String>,
        state: StateHandle,
        feeds: Vec<FeedHandle>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            state,
            feeds,
            interval: Duration::from_secs(5),
            write_timeout: Duration::from_secs(3),
            started_at: Utc::now(),
            pid: std::process::id(),
            tick: 0,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    #[must_use]
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Assemble the next record. Does not advance the tick.
    pub async fn snapshot(
        &self,
        worker_state: WorkerState,
        shutdown: Option<ShutdownInfo>,
    ) -> Result<WorkerHeartbeat> {
        let cache = self.state.cache_stats().await?;
        let circuit_breaker = self.state.breaker().await?;
        Ok(WorkerHeartbeat {
            version: HEARTBEAT_VERSION,
            state: worker_state,
            tick: self.tick + 1,
            pid: self.pid,
            started_at: self.started_at,
            updated_at: Utc::now(),
            venues: self.feeds.iter().map(FeedHandle::status).collect(),
            cache,
            circuit_breaker,
            shutdown,
        })
    }

    /// Write one heartbeat. Returns whether the write landed.
    pub async fn publish(&mut self, worker_state: WorkerState) -> bool {
        self.publish_with(worker_state, None).await
    }

    /// Final `STOPPING` write carrying shutdown metadata.
    pub async fn publish_stopping(&mut self, reason: impl Into<String>, requested_at: DateTime<Utc>) -> bool {
        let info = ShutdownInfo {
            reason: reason.into(),
            started_at: self.started_at,
            requested_at,
        };
        let written = self.publish_with(WorkerState::Stopping, Some(info)).await;
        info!(tick = self.tick, written, "Heartbeat writer stopped");
        written
    }

    /// Publish `RUNNING` every interval until `shutdown` fires, then hand
    /// the publisher back for the final write.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        let interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX);
        info!(key = %self.key, interval_ms, "Heartbeat writer started");
        let mut ticker = interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    self.publish(WorkerState::Running).await;
                }
                _ = shutdown.changed() => break,
            }
        }
        self
    }

    async fn publish_with(&mut self, worker_state: WorkerState, shutdown: Option<ShutdownInfo>) -> bool {
        let heartbeat = match self.snapshot(worker_state, shutdown).await {
            Ok(heartbeat) => heartbeat,
            Err(e) => {
                warn!(error = %e, "Heartbeat snapshot failed, skipping cycle");
                return false;
            }
        };
        let body = match serde_json::to_string(&heartbeat) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Heartbeat serialization failed, skipping cycle");
                return false;
            }
        };

        let timeout_ms = u64::try_from(self.write_timeout.as_millis()).unwrap_or(u64::MAX);
        let result = match timeout(self.write_timeout, self.store.set(&self.key, &body)).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout { timeout_ms }),
        };
        match result {
            Ok(()) => {
                self.tick = heartbeat.tick;
                debug!(tick = self.tick, state = %worker_state, "Heartbeat published");
                true
            }
            Err(e) => {
                warn!(error = %e, tick = heartbeat.tick, "Heartbeat publish failed, retrying next cycle");
                false
            }
        }
    }
}
