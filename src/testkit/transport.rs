//! Mock [`FeedTransport`] implementations and feed test helpers.
//!
//! - [`ScriptedTransport`] - Pre-loaded connect results and frame queue.
//!   Once the queue drains the connection goes quiet rather than ending.
//! - [`RecordingObserver`] - Captures every connection state change.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::feed::{ConnectionObserver, StateChange};
use crate::domain::ConnectionState;
use crate::error::{FeedError, Result};
use crate::port::outbound::feed::{FeedTransport, Frame};

/// Shared call counters of a [`ScriptedTransport`].
#[derive(Debug, Clone, Default)]
pub struct TransportCounts {
    pub connects: Arc<AtomicU32>,
    pub pings: Arc<AtomicU32>,
    pub closes: Arc<AtomicU32>,
    pub sent: Arc<Mutex<Vec<String>>>,
}

impl TransportCounts {
    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> u32 {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

/// A transport with scripted connect results and a fixed frame queue.
///
/// Each `connect()` pops the next result (defaults to `Ok(())` when the
/// queue is exhausted). Each successful connect releases the next batch of
/// frames; when a batch is empty `next_frame()` blocks forever.
pub struct ScriptedTransport {
    connect_results: VecDeque<std::result::Result<(), FeedError>>,
    batches: VecDeque<Vec<Frame>>,
    frames: VecDeque<Frame>,
    connect_delay: Option<Duration>,
    connected: bool,
    counts: TransportCounts,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            batches: VecDeque::new(),
            frames: VecDeque::new(),
            connect_delay: None,
            connected: false,
            counts: TransportCounts::default(),
        }
    }

    pub fn with_connect_results(mut self, results: Vec<std::result::Result<(), FeedError>>) -> Self {
        self.connect_results = results.into();
        self
    }

    /// Frames delivered on the next successful connection. Call repeatedly
    /// to script later connections.
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.batches.push_back(frames);
        self
    }

    /// Make every `connect()` take this long before resolving.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    pub fn counts(&self) -> TransportCounts {
        self.counts.clone()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedTransport for ScriptedTransport {
    async fn connect(&mut self) -> std::result::Result<(), FeedError> {
        self.counts.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.connect_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.connected = true;
            self.frames = self.batches.pop_front().unwrap_or_default().into();
        }
        result
    }

    async fn send(&mut self, message: String) -> std::result::Result<(), FeedError> {
        if !self.connected {
            return Err(FeedError::NotConnected);
        }
        self.counts.sent.lock().push(message);
        Ok(())
    }

    async fn ping(&mut self) -> std::result::Result<(), FeedError> {
        self.counts.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Frame> {
        match self.frames.pop_front() {
            Some(frame) => Some(frame),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        if self.connected {
            self.counts.closes.fetch_add(1, Ordering::SeqCst);
        }
        self.connected = false;
        self.frames.clear();
    }
}

/// Observer that records every state change for later assertions.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    changes: Mutex<Vec<StateChange>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn changes(&self) -> Vec<StateChange> {
        self.changes.lock().clone()
    }

    /// Target states in order.
    pub fn states(&self) -> Vec<ConnectionState> {
        self.changes.lock().iter().map(|c| c.to).collect()
    }
}

impl ConnectionObserver for RecordingObserver {
    fn on_state_change(&self, change: &StateChange) -> Result<()> {
        self.changes.lock().push(change.clone());
        Ok(())
    }
}
