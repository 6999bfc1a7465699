//! Polymarket CLOB market channel.
//!
//! Prices arrive as dollar strings (`"0.45"`) and are converted to cents.
//! Frames are either a single event object or an array of them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::millis;
use crate::error::ParseError;
use crate::port::outbound::feed::{FeedEvent, VenueCodec};

const NAME: &str = "polymarket";

#[derive(Debug, Serialize)]
struct SubscribeMessage<'a> {
    assets_ids: &'a [String],
    #[serde(rename = "type")]
    msg_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Many(Vec<Message>),
    One(Message),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
enum Message {
    Book(BookMessage),
    PriceChange(PriceChangeMessage),
    LastTradePrice(TradeMessage),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct BookMessage {
    asset_id: String,
    #[serde(default)]
    bids: Vec<Level>,
    #[serde(default)]
    asks: Vec<Level>,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Level {
    price: Decimal,
    size: Decimal,
}

#[derive(Debug, Deserialize)]
struct PriceChangeMessage {
    #[serde(default)]
    price_changes: Vec<PriceChange>,
    asset_id: Option<String>,
    price: Option<Decimal>,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceChange {
    asset_id: String,
    price: Option<Decimal>,
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct TradeMessage {
    asset_id: String,
    price: Decimal,
    size: Option<Decimal>,
    timestamp: Option<String>,
}

/// Codec for Polymarket's market WebSocket channel.
#[derive(Debug, Clone, Default)]
pub struct PolymarketCodec;

impl PolymarketCodec {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn message(&self, instruments: &[String], operation: Option<&'static str>) -> Vec<String> {
        let message = SubscribeMessage {
            assets_ids: instruments,
            msg_type: "market",
            operation,
        };
        serde_json::to_string(&message).into_iter().collect()
    }
}

impl VenueCodec for PolymarketCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn subscribe(&self, instruments: &[String]) -> Vec<String> {
        self.message(instruments, None)
    }

    fn unsubscribe(&self, instruments: &[String]) -> Vec<String> {
        self.message(instruments, Some("unsubscribe"))
    }

    fn decode(&self, text: &str) -> Result<Vec<FeedEvent>, ParseError> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("pong") {
            return Ok(Vec::new());
        }
        let payload: Payload =
            serde_json::from_str(trimmed).map_err(|e| ParseError::new(NAME, e.to_string()))?;
        let messages = match payload {
            Payload::Many(messages) => messages,
            Payload::One(message) => vec![message],
        };
        let mut decoded = Vec::new();
        for message in messages {
            decoded.extend(events(message)?);
        }
        Ok(decoded)
    }
}

fn events(message: Message) -> Result<Vec<FeedEvent>, ParseError> {
    match message {
        Message::Book(book) => {
            let best_bid = book.bids.iter().filter(|l| l.size > Decimal::ZERO).map(|l| l.price).max();
            let best_ask = book.asks.iter().filter(|l| l.size > Decimal::ZERO).map(|l| l.price).min();
            Ok(vec![FeedEvent::Orderbook {
                instrument: book.asset_id,
                best_bid: best_bid.map(cents).transpose()?,
                best_ask: best_ask.map(cents).transpose()?,
                captured_at: timestamp(book.timestamp.as_deref()),
            }])
        }
        Message::PriceChange(change) => {
            let captured_at = timestamp(change.timestamp.as_deref());
            if change.price_changes.is_empty() {
                return match (change.asset_id, change.price) {
                    (Some(instrument), Some(price)) => Ok(vec![FeedEvent::Price {
                        instrument,
                        price: cents(price)?,
                        captured_at,
                    }]),
                    _ => Ok(Vec::new()),
                };
            }
            let mut events = Vec::with_capacity(change.price_changes.len());
            for c in change.price_changes {
                if c.best_bid.is_some() || c.best_ask.is_some() {
                    events.push(FeedEvent::Orderbook {
                        instrument: c.asset_id,
                        best_bid: c.best_bid.map(cents).transpose()?,
                        best_ask: c.best_ask.map(cents).transpose()?,
                        captured_at,
                    });
                } else if let Some(price) = c.price {
                    events.push(FeedEvent::Price {
                        instrument: c.asset_id,
                        price: cents(price)?,
                        captured_at,
                    });
                }
            }
            Ok(events)
        }
        Message::LastTradePrice(trade) => Ok(vec![FeedEvent::Trade {
            instrument: trade.asset_id,
            price: cents(trade.price)?,
            size: trade.size,
            captured_at: timestamp(trade.timestamp.as_deref()),
        }]),
        Message::Other => Ok(Vec::new()),
    }
}

fn cents(dollars: Decimal) -> Result<Decimal, ParseError> {
    dollars
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| ParseError::new(NAME, format!("price {dollars} out of range")))
}

fn timestamp(raw: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    raw.and_then(|s| s.parse::<i64>().ok()).and_then(millis)
}
