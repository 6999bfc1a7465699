//! Feed ports: the streaming connection and the venue wire format.
//!
//! The feed client owns one [`FeedTransport`] and one [`VenueCodec`]. The
//! transport moves text frames; the codec turns them into [`FeedEvent`]s and
//! builds subscribe/unsubscribe messages. Keeping the two apart lets the
//! client state machine be driven by a scripted transport in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{FeedError, ParseError};

/// One inbound unit from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text payload to hand to the codec.
    Text(String),
    /// The remote side closed the connection or the transport failed.
    Closed { reason: String },
}

/// A streaming connection to one venue.
#[async_trait]
pub trait FeedTransport: Send {
    /// Open the connection.
    async fn connect(&mut self) -> Result<(), FeedError>;

    /// Send a text message over an open connection.
    async fn send(&mut self, message: String) -> Result<(), FeedError>;

    /// Send a keepalive ping.
    async fn ping(&mut self) -> Result<(), FeedError>;

    /// Wait for the next frame. `None` means the stream ended.
    async fn next_frame(&mut self) -> Option<Frame>;

    /// Close the connection. Safe to call when already closed.
    async fn close(&mut self);
}

/// A decoded inbound event, in venue-native price units.
///
/// `instrument` is the venue's own identifier for what was quoted (a token
/// id, a ticker, an outcome key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Orderbook {
        instrument: String,
        best_bid: Option<Decimal>,
        best_ask: Option<Decimal>,
        captured_at: Option<DateTime<Utc>>,
    },
    Price {
        instrument: String,
        price: Decimal,
        captured_at: Option<DateTime<Utc>>,
    },
    Trade {
        instrument: String,
        price: Decimal,
        size: Option<Decimal>,
        captured_at: Option<DateTime<Utc>>,
    },
}

impl FeedEvent {
    #[must_use]
    pub fn instrument(&self) -> &str {
        match self {
            Self::Orderbook { instrument, .. }
            | Self::Price { instrument, .. }
            | Self::Trade { instrument, .. } => instrument,
        }
    }
}

/// Venue-specific wire format.
pub trait VenueCodec: Send + Sync {
    /// Short name used in logs and parse errors.
    fn name(&self) -> &'static str;

    /// Messages to send to start receiving updates for `instruments`.
    fn subscribe(&self, instruments: &[String]) -> Vec<String>;

    /// Messages to send to stop receiving updates for `instruments`.
    fn unsubscribe(&self, instruments: &[String]) -> Vec<String>;

    /// Decode one text frame. Frames the codec recognises but does not
    /// consume (acks, heartbeats) decode to an empty list.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for malformed payloads.
    fn decode(&self, text: &str) -> Result<Vec<FeedEvent>, ParseError>;
}
