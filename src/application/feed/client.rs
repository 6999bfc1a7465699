//! Feed client connection state machine.
//!
//! ```text
//! disconnected ──connect()──▶ connecting ──ok──▶ connected
//!      ▲                        │  ▲              │
//!      │                   fail │  │ delay        │ close / error
//!      │                        ▼  │              ▼
//!  disconnect()  ◀──────────  reconnecting ◀──────┘
//!                               │
//!                 attempts ≥ max▼
//!                             error ──connect()──▶ connecting
//! ```
//!
//! Each client runs as its own task and is driven through a [`FeedHandle`].
//! Timers (retry delay, keepalive) live inside the state they belong to and
//! are dropped on every transition out of it.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use super::backoff::Backoff;
use super::dispatch::price_updates;
use super::observer::{ObserverSet, StateChange};
use super::subscription::{Subscription, SubscriptionSet};
use crate::application::state::StateHandle;
use crate::domain::{ConnectionState, MarketKind, VenueConnection, VenueId};
use crate::error::{Error, FeedError, Result};
use crate::port::outbound::feed::{FeedTransport, Frame, VenueCodec};

/// Reconnect and keepalive tuning for one feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    pub backoff: Backoff,
    /// Reconnect attempts before the client parks in `error`.
    pub max_attempts: u32,
    pub connect_timeout: Duration,
    pub ping_interval: Duration,
    pub command_capacity: usize,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            backoff: Backoff::default(),
            max_attempts: 10,
            connect_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
            command_capacity: 64,
        }
    }
}

enum FeedCommand {
    Connect,
    Disconnect,
    Subscribe(Vec<Subscription>),
    Unsubscribe(Vec<String>),
}

/// Cloneable control surface of a running [`FeedClient`].
#[derive(Clone)]
pub struct FeedHandle {
    venue: VenueId,
    tx: mpsc::Sender<FeedCommand>,
    status: watch::Receiver<VenueConnection>,
}

impl FeedHandle {
    #[must_use]
    pub const fn venue(&self) -> &VenueId {
        &self.venue
    }

    /// Start connecting. Ignored unless the client is `disconnected` or
    /// `error`; from `error` the attempt counter starts over.
    pub async fn connect(&self) -> Result<()> {
        self.send(FeedCommand::Connect).await
    }

    /// Close the connection and cancel any pending retry.
    pub async fn disconnect(&self) -> Result<()> {
        self.send(FeedCommand::Disconnect).await
    }

    /// Track instruments. They are sent now if connected and again after
    /// every reconnect.
    pub async fn subscribe(&self, subscriptions: Vec<Subscription>) -> Result<()> {
        self.send(FeedCommand::Subscribe(subscriptions)).await
    }

    pub async fn unsubscribe(&self, instruments: Vec<String>) -> Result<()> {
        self.send(FeedCommand::Unsubscribe(instruments)).await
    }

    /// Latest published connection status.
    #[must_use]
    pub fn status(&self) -> VenueConnection {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<VenueConnection> {
        self.status.clone()
    }

    /// Wait until the client reports `state`.
    pub async fn wait_for_state(&self, state: ConnectionState) -> Result<VenueConnection> {
        let mut rx = self.status.clone();
        let status = rx
            .wait_for(|s| s.state == state)
            .await
            .map_err(|_| Error::ChannelClosed)?;
        Ok((*status).clone())
    }

    async fn send(&self, command: FeedCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::ChannelClosed)
    }
}

/// One venue's streaming connection.
pub struct FeedClient<T, C> {
    venue: VenueId,
    transport: T,
    codec: C,
    config: FeedClientConfig,
    sink: StateHandle,
    observers: ObserverSet,
    state: ConnectionState,
    attempts: u32,
    retry_at: Option<Instant>,
    subscriptions: SubscriptionSet,
    status: watch::Sender<VenueConnection>,
    commands: mpsc::Receiver<FeedCommand>,
    handle: FeedHandle,
}

impl<T, C> FeedClient<T, C>
where
    T: FeedTransport + 'static,
    C: VenueCodec + 'static,
{
    pub fn new(
        venue: impl Into<VenueId>,
        kind: MarketKind,
        transport: T,
        codec: C,
        config: FeedClientConfig,
        sink: StateHandle,
    ) -> Self {
        let venue = venue.into();
        let (tx, commands) = mpsc::channel(config.command_capacity.max(1));
        let (status, status_rx) = watch::channel(VenueConnection::new(venue.clone(), kind));
        let handle = FeedHandle {
            venue: venue.clone(),
            tx,
            status: status_rx,
        };
        Self {
            venue,
            transport,
            codec,
            config,
            sink,
            observers: ObserverSet::new(),
            state: ConnectionState::Disconnected,
            attempts: 0,
            retry_at: None,
            subscriptions: SubscriptionSet::default(),
            status,
            commands,
            handle,
        }
    }

    #[must_use]
    pub fn with_observers(mut self, observers: ObserverSet) -> Self {
        self.observers = observers;
        self
    }

    #[must_use]
    pub fn handle(&self) -> FeedHandle {
        self.handle.clone()
    }

    /// Drive the state machine until `shutdown` flips to true or its
    /// sender is dropped. The connection is closed on exit.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(venue = %self.venue, codec = self.codec.name(), "Feed client started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let proceed = match self.state {
                ConnectionState::Disconnected | ConnectionState::Error => {
                    self.idle(&mut shutdown).await
                }
                ConnectionState::Connecting => {
                    self.attempt_connect().await;
                    true
                }
                ConnectionState::Connected => self.stream(&mut shutdown).await,
                ConnectionState::Reconnecting => self.wait_retry(&mut shutdown).await,
            };
            if !proceed {
                break;
            }
        }
        self.transport.close().await;
        self.retry_at = None;
        self.transition(ConnectionState::Disconnected, Some("shutdown".into()));
        info!(venue = %self.venue, "Feed client stopped");
    }

    async fn idle(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            command = self.commands.recv() => match command {
                Some(command) => {
                    self.handle_command(command).await;
                    true
                }
                None => false,
            },
            _ = shutdown.changed() => false,
        }
    }

    async fn attempt_connect(&mut self) {
        let timeout_ms = u64::try_from(self.config.connect_timeout.as_millis()).unwrap_or(u64::MAX);
        let result = match timeout(self.config.connect_timeout, self.transport.connect()).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout { timeout_ms }),
        };
        match result {
            Ok(()) => self.on_open().await,
            Err(e) => self.on_failure(e.to_string()).await,
        }
    }

    async fn on_open(&mut self) {
        self.attempts = 0;
        let now = Utc::now();
        self.status.send_modify(|s| s.connected_at = Some(now));
        self.transition(ConnectionState::Connected, None);

        let instruments = self.subscriptions.instruments();
        if instruments.is_empty() {
            return;
        }
        let messages = self.codec.subscribe(&instruments);
        if let Err(e) = self.send_all(messages).await {
            self.on_failure(format!("resubscribe failed: {e}")).await;
            return;
        }
        debug!(venue = %self.venue, count = instruments.len(), "Resubscribed after connect");
    }

    async fn on_failure(&mut self, reason: String) {
        self.transport.close().await;

        if self.attempts >= self.config.max_attempts {
            let terminal = FeedError::Terminal {
                attempts: self.attempts,
            };
            error!(
                venue = %self.venue,
                attempts = self.attempts,
                reason = %reason,
                "Feed gave up reconnecting"
            );
            self.retry_at = None;
            self.transition(ConnectionState::Error, Some(format!("{reason}; {terminal}")));
            return;
        }

        let delay = self.config.backoff.delay(self.attempts);
        self.attempts += 1;
        self.retry_at = Some(Instant::now() + delay);
        warn!(
            venue = %self.venue,
            attempt = self.attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            reason = %reason,
            "Feed connection lost, scheduling reconnect"
        );
        self.transition(ConnectionState::Reconnecting, Some(reason));
    }

    async fn wait_retry(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let deadline = self.retry_at.unwrap_or_else(Instant::now);
        tokio::select! {
            () = sleep_until(deadline) => {
                self.retry_at = None;
                self.transition(ConnectionState::Connecting, None);
                true
            }
            command = self.commands.recv() => match command {
                Some(command) => {
                    self.handle_command(command).await;
                    true
                }
                None => false,
            },
            _ = shutdown.changed() => false,
        }
    }

    async fn stream(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let period = self.config.ping_interval.max(Duration::from_millis(1));
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = self.transport.next_frame() => match frame {
                    Some(Frame::Text(text)) => self.dispatch(&text).await,
                    Some(Frame::Closed { reason }) => {
                        self.on_failure(reason).await;
                        return true;
                    }
                    None => {
                        self.on_failure("stream ended".into()).await;
                        return true;
                    }
                },
                _ = keepalive.tick() => {
                    if let Err(e) = self.transport.ping().await {
                        self.on_failure(format!("ping failed: {e}")).await;
                        return true;
                    }
                }
                command = self.commands.recv() => match command {
                    Some(command) => {
                        self.handle_command(command).await;
                        if self.state != ConnectionState::Connected {
                            return true;
                        }
                    }
                    None => return false,
                },
                _ = shutdown.changed() => return false,
            }
        }
    }

    async fn dispatch(&mut self, text: &str) {
        let now = Utc::now();
        let events = match self.codec.decode(text) {
            Ok(events) => events,
            Err(e) => {
                self.status.send_modify(|s| s.parse_errors += 1);
                warn!(venue = %self.venue, error = %e, "Dropping malformed feed message");
                return;
            }
        };
        self.status.send_modify(|s| {
            s.messages_received += 1;
            s.last_message_at = Some(now);
        });

        for event in events {
            let Some(subscription) = self.subscriptions.get(event.instrument()) else {
                trace!(venue = %self.venue, instrument = event.instrument(), "Update for untracked instrument");
                continue;
            };
            for update in price_updates(&self.venue, subscription, &event) {
                if let Err(e) = self.sink.update_price(update).await {
                    warn!(venue = %self.venue, error = %e, "Price cache unavailable");
                }
            }
        }
    }

    async fn handle_command(&mut self, command: FeedCommand) {
        match command {
            FeedCommand::Connect => match self.state {
                ConnectionState::Disconnected | ConnectionState::Error => {
                    self.attempts = 0;
                    self.transition(ConnectionState::Connecting, None);
                }
                state => debug!(venue = %self.venue, state = %state, "Connect ignored"),
            },
            FeedCommand::Disconnect => {
                if self.state != ConnectionState::Disconnected {
                    self.transport.close().await;
                    self.attempts = 0;
                    self.retry_at = None;
                    self.transition(ConnectionState::Disconnected, Some("requested".into()));
                }
            }
            FeedCommand::Subscribe(subscriptions) => {
                let added = self.subscriptions.insert_all(subscriptions);
                let count = self.subscriptions.len();
                self.status.send_modify(|s| s.subscriptions = count);
                if self.state == ConnectionState::Connected && !added.is_empty() {
                    let messages = self.codec.subscribe(&added);
                    if let Err(e) = self.send_all(messages).await {
                        self.on_failure(format!("subscribe failed: {e}")).await;
                    }
                }
            }
            FeedCommand::Unsubscribe(instruments) => {
                let removed = self.subscriptions.remove_all(&instruments);
                let count = self.subscriptions.len();
                self.status.send_modify(|s| s.subscriptions = count);
                if self.state == ConnectionState::Connected && !removed.is_empty() {
                    let messages = self.codec.unsubscribe(&removed);
                    if let Err(e) = self.send_all(messages).await {
                        self.on_failure(format!("unsubscribe failed: {e}")).await;
                    }
                }
            }
        }
    }

    async fn send_all(&mut self, messages: Vec<String>) -> std::result::Result<(), FeedError> {
        for message in messages {
            self.transport.send(message).await?;
        }
        Ok(())
    }

    fn transition(&mut self, to: ConnectionState, reason: Option<String>) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        let attempts = self.attempts;
        let subscriptions = self.subscriptions.len();
        self.status.send_modify(|s| {
            s.state = to;
            s.reconnect_attempts = attempts;
            s.subscriptions = subscriptions;
        });
        info!(
            venue = %self.venue,
            from = %from,
            to = %to,
            reason = reason.as_deref().unwrap_or(""),
            "Feed state changed"
        );
        self.observers.notify(&StateChange {
            venue: self.venue.clone(),
            from,
            to,
            reason,
            at: Utc::now(),
        });
    }
}
