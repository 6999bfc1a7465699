//! Stateless heartbeat reader.
//!
//! Never fails: every outcome, including an unreachable or misconfigured
//! store, is reported as a typed [`HeartbeatStatus`] with a reason. Ages and
//! staleness are derived here from raw timestamps using the reader's clock.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::timeout;

use crate::domain::heartbeat::HEARTBEAT_VERSION;
use crate::domain::{
    CacheSummary, CircuitBreakerState, ConnectionState, MarketKind, ShutdownInfo, VenueConnection,
    VenueId, WorkerHeartbeat, WorkerState,
};
use crate::error::StorageError;
use crate::port::outbound::store::KvStore;

/// Outcome of reading the heartbeat key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatStatus {
    Ok,
    Misconfigured,
    NoHeartbeat,
    ParseError,
    KvUnreachable,
}

impl HeartbeatStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Misconfigured => "misconfigured",
            Self::NoHeartbeat => "no_heartbeat",
            Self::ParseError => "parse_error",
            Self::KvUnreachable => "kv_unreachable",
        }
    }
}

impl fmt::Display for HeartbeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One venue as seen by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueView {
    pub venue: VenueId,
    pub kind: MarketKind,
    pub state: ConnectionState,
    pub connected: bool,
    pub last_message_at: Option<DateTime<Utc>>,
    /// Recomputed with the reader's clock.
    pub message_age_ms: Option<i64>,
    pub stale: bool,
    pub messages_received: u64,
    pub parse_errors: u64,
    pub reconnect_attempts: u32,
}

/// Derived worker status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerStatus {
    pub status: HeartbeatStatus,
    pub reason: Option<String>,
    pub checked_at: DateTime<Utc>,
    pub worker_present: bool,
    /// Present, `RUNNING`, breaker closed and at least one venue connected.
    pub ready: bool,
    pub heartbeat_age_ms: Option<i64>,
    pub state: Option<WorkerState>,
    pub tick: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    pub venues: Vec<VenueView>,
    pub circuit_breaker: Option<CircuitBreakerState>,
    pub cache: Option<CacheSummary>,
    pub shutdown: Option<ShutdownInfo>,
}

impl WorkerStatus {
    fn failed(status: HeartbeatStatus, reason: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status,
            reason: Some(reason.into()),
            checked_at: now,
            worker_present: false,
            ready: false,
            heartbeat_age_ms: None,
            state: None,
            tick: None,
            started_at: None,
            venues: Vec::new(),
            circuit_breaker: None,
            cache: None,
            shutdown: None,
        }
    }
}

pub struct HeartbeatReader {
    store: Option<Arc<dyn KvStore>>,
    key: String,
    stale_ms: i64,
    venue_stale_ms: i64,
    read_timeout: Duration,
}

impl HeartbeatReader {
    /// `store` is `None` when no store is configured.
    pub fn new(store: Option<Arc<dyn KvStore>>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            stale_ms: 30_000,
            venue_stale_ms: 30_000,
            read_timeout: Duration::from_secs(3),
        }
    }

    /// Heartbeat age beyond which the worker counts as absent.
    #[must_use]
    pub fn with_stale_ms(mut self, stale_ms: i64) -> Self {
        self.stale_ms = stale_ms;
        self
    }

    /// Message age beyond which a venue counts as stale.
    #[must_use]
    pub fn with_venue_stale_ms(mut self, venue_stale_ms: i64) -> Self {
        self.venue_stale_ms = venue_stale_ms;
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub async fn read(&self) -> WorkerStatus {
        self.read_at(Utc::now()).await
    }

    /// Read and classify using `now` as the reader's clock.
    pub async fn read_at(&self, now: DateTime<Utc>) -> WorkerStatus {
        let Some(store) = &self.store else {
            return WorkerStatus::failed(HeartbeatStatus::Misconfigured, "no store configured", now);
        };
        let timeout_ms = u64::try_from(self.read_timeout.as_millis()).unwrap_or(u64::MAX);
        let raw = match timeout(self.read_timeout, store.get(&self.key)).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout { timeout_ms }),
        };
        self.classify(raw, now)
    }

    /// Classify a raw store read.
    #[must_use]
    pub fn classify(&self, raw: Result<Option<String>, StorageError>, now: DateTime<Utc>) -> WorkerStatus {
        let body = match raw {
            Ok(Some(body)) => body,
            Ok(None) => {
                return WorkerStatus::failed(
                    HeartbeatStatus::NoHeartbeat,
                    format!("key {} not found", self.key),
                    now,
                )
            }
            Err(StorageError::Misconfigured(reason)) => {
                return WorkerStatus::failed(HeartbeatStatus::Misconfigured, reason, now)
            }
            Err(e) => return WorkerStatus::failed(HeartbeatStatus::KvUnreachable, e.to_string(), now),
        };

        let heartbeat: WorkerHeartbeat = match serde_json::from_str(&body) {
            Ok(heartbeat) => heartbeat,
            Err(e) => {
                return WorkerStatus::failed(
                    HeartbeatStatus::ParseError,
                    format!("invalid heartbeat: {e}"),
                    now,
                )
            }
        };
        if heartbeat.version > HEARTBEAT_VERSION {
            return WorkerStatus::failed(
                HeartbeatStatus::ParseError,
                format!("unsupported heartbeat version {}", heartbeat.version),
                now,
            );
        }

        self.derive(heartbeat, now)
    }

    fn derive(&self, heartbeat: WorkerHeartbeat, now: DateTime<Utc>) -> WorkerStatus {
        let age_ms = (now - heartbeat.updated_at).num_milliseconds();
        let worker_present = age_ms <= self.stale_ms;
        let venues: Vec<VenueView> = heartbeat
            .venues
            .iter()
            .map(|venue| self.venue_view(venue, now))
            .collect();
        let any_connected = venues.iter().any(|v| v.connected);
        let breaker_open = heartbeat.circuit_breaker.is_open;
        let running = heartbeat.state == WorkerState::Running;
        let ready = worker_present && running && !breaker_open && any_connected;

        let reason = if !worker_present {
            Some(format!("heartbeat is {age_ms}ms old (stale after {}ms)", self.stale_ms))
        } else if let Some(shutdown) = &heartbeat.shutdown {
            Some(format!("worker stopping: {}", shutdown.reason))
        } else if !running {
            Some(format!("worker is {}", heartbeat.state))
        } else if breaker_open {
            Some(format!(
                "circuit breaker open: {}",
                heartbeat.circuit_breaker.open_reason.as_deref().unwrap_or("unknown")
            ))
        } else if !any_connected {
            Some("no venue connected".to_string())
        } else {
            None
        };

        WorkerStatus {
            status: HeartbeatStatus::Ok,
            reason,
            checked_at: now,
            worker_present,
            ready,
            heartbeat_age_ms: Some(age_ms),
            state: Some(heartbeat.state),
            tick: Some(heartbeat.tick),
            started_at: Some(heartbeat.started_at),
            venues,
            circuit_breaker: Some(heartbeat.circuit_breaker),
            cache: Some(heartbeat.cache),
            shutdown: heartbeat.shutdown,
        }
    }

    fn venue_view(&self, venue: &VenueConnection, now: DateTime<Utc>) -> VenueView {
        let message_age_ms = venue
            .last_message_at
            .map(|at| (now - at).num_milliseconds());
        VenueView {
            venue: venue.venue.clone(),
            kind: venue.kind,
            state: venue.state,
            connected: venue.state.is_connected(),
            last_message_at: venue.last_message_at,
            message_age_ms,
            stale: message_age_ms.map_or(true, |age| age > self.venue_stale_ms),
            messages_received: venue.messages_received,
            parse_errors: venue.parse_errors,
            reconnect_attempts: venue.reconnect_attempts,
        }
    }
}
