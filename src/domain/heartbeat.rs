//! Worker heartbeat record published to the shared store.
//!
//! The record carries raw timestamps only. Readers derive ages and
//! staleness with their own clock, since any pre-computed value would
//! already be out of date by the time it is read.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::breaker::CircuitBreakerState;
use super::id::VenueId;
use super::market::MarketKind;

/// Current heartbeat schema version.
pub const HEARTBEAT_VERSION: u32 = 1;

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
        })
    }
}

/// Feed client connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

impl ConnectionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-venue feed status as seen by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueConnection {
    pub venue: VenueId,
    pub kind: MarketKind,
    pub state: ConnectionState,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub connected_at: Option<DateTime<Utc>>,
    pub messages_received: u64,
    pub parse_errors: u64,
    pub reconnect_attempts: u32,
    pub subscriptions: usize,
}

impl VenueConnection {
    #[must_use]
    pub fn new(venue: VenueId, kind: MarketKind) -> Self {
        Self {
            venue,
            kind,
            state: ConnectionState::Disconnected,
            last_message_at: None,
            connected_at: None,
            messages_received: 0,
            parse_errors: 0,
            reconnect_attempts: 0,
            subscriptions: 0,
        }
    }
}

/// Price cache summary statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSummary {
    pub total_entries: usize,
    pub total_updates: u64,
    #[serde(default)]
    pub entries_by_venue: BTreeMap<VenueId, usize>,
    #[serde(default)]
    pub newest_capture_at: Option<DateTime<Utc>>,
}

/// Metadata written once on graceful shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownInfo {
    pub reason: String,
    pub started_at: DateTime<Utc>,
    pub requested_at: DateTime<Utc>,
}

/// The full snapshot written under the heartbeat key each cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerHeartbeat {
    pub version: u32,
    pub state: WorkerState,
    /// Monotonic write counter; a stalled publisher stops advancing it.
    pub tick: u64,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub venues: Vec<VenueConnection>,
    pub cache: CacheSummary,
    pub circuit_breaker: CircuitBreakerState,
    #[serde(default)]
    pub shutdown: Option<ShutdownInfo>,
}
