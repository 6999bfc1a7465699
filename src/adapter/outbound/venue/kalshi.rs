//! Kalshi trade-API WebSocket.
//!
//! Prices are integer cents. The book carries resting YES and NO bids only;
//! the YES ask is implied as `100 - best NO bid`. Incremental
//! `orderbook_delta` frames are not applied; top of book is refreshed from
//! snapshots and the `ticker` channel.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::millis;
use crate::error::ParseError;
use crate::port::outbound::feed::{FeedEvent, VenueCodec};

const NAME: &str = "kalshi";
const CHANNELS: [&str; 3] = ["orderbook_delta", "ticker", "trade"];

#[derive(Debug, Serialize)]
struct Command<'a> {
    id: u64,
    cmd: &'static str,
    params: CommandParams<'a>,
}

#[derive(Debug, Serialize)]
struct CommandParams<'a> {
    channels: &'static [&'static str],
    market_tickers: &'a [String],
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    msg: Value,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    market_ticker: String,
    #[serde(default)]
    yes: Vec<(Decimal, Decimal)>,
    #[serde(default)]
    no: Vec<(Decimal, Decimal)>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    market_ticker: String,
    price: Option<Decimal>,
    yes_bid: Option<Decimal>,
    yes_ask: Option<Decimal>,
    ts: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Trade {
    market_ticker: String,
    yes_price: Decimal,
    count: Option<Decimal>,
    ts: Option<i64>,
}

/// Codec for Kalshi market data channels. Command ids increase per message.
#[derive(Debug, Default)]
pub struct KalshiCodec {
    next_id: AtomicU64,
}

impl KalshiCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    fn command(&self, cmd: &'static str, instruments: &[String]) -> Vec<String> {
        let command = Command {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            cmd,
            params: CommandParams {
                channels: &CHANNELS,
                market_tickers: instruments,
            },
        };
        serde_json::to_string(&command).into_iter().collect()
    }
}

impl VenueCodec for KalshiCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn subscribe(&self, instruments: &[String]) -> Vec<String> {
        self.command("subscribe", instruments)
    }

    fn unsubscribe(&self, instruments: &[String]) -> Vec<String> {
        self.command("unsubscribe", instruments)
    }

    fn decode(&self, text: &str) -> Result<Vec<FeedEvent>, ParseError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| ParseError::new(NAME, e.to_string()))?;
        match envelope.msg_type.as_str() {
            "orderbook_snapshot" => {
                let snapshot: Snapshot = body(envelope.msg)?;
                let best_bid = best(&snapshot.yes);
                let best_ask = best(&snapshot.no)
                    .map(|no_bid| {
                        Decimal::ONE_HUNDRED
                            .checked_sub(no_bid)
                            .ok_or_else(|| ParseError::new(NAME, format!("no bid {no_bid} out of range")))
                    })
                    .transpose()?;
                Ok(vec![FeedEvent::Orderbook {
                    instrument: snapshot.market_ticker,
                    best_bid,
                    best_ask,
                    captured_at: None,
                }])
            }
            "ticker" | "ticker_v2" => {
                let ticker: Ticker = body(envelope.msg)?;
                let captured_at = ticker.ts.and_then(seconds);
                if ticker.yes_bid.is_some() || ticker.yes_ask.is_some() {
                    Ok(vec![FeedEvent::Orderbook {
                        instrument: ticker.market_ticker,
                        best_bid: ticker.yes_bid,
                        best_ask: ticker.yes_ask,
                        captured_at,
                    }])
                } else {
                    Ok(ticker
                        .price
                        .map(|price| FeedEvent::Price {
                            instrument: ticker.market_ticker,
                            price,
                            captured_at,
                        })
                        .into_iter()
                        .collect())
                }
            }
            "trade" => {
                let trade: Trade = body(envelope.msg)?;
                Ok(vec![FeedEvent::Trade {
                    instrument: trade.market_ticker,
                    price: trade.yes_price,
                    size: trade.count,
                    captured_at: trade.ts.and_then(seconds),
                }])
            }
            "error" => Err(ParseError::new(NAME, format!("venue error: {}", envelope.msg))),
            _ => Ok(Vec::new()),
        }
    }
}

fn body<T: serde::de::DeserializeOwned>(msg: Value) -> Result<T, ParseError> {
    serde_json::from_value(msg).map_err(|e| ParseError::new(NAME, e.to_string()))
}

fn best(levels: &[(Decimal, Decimal)]) -> Option<Decimal> {
    levels
        .iter()
        .filter(|(_, quantity)| *quantity > Decimal::ZERO)
        .map(|(price, _)| *price)
        .max()
}

fn seconds(ts: i64) -> Option<DateTime<Utc>> {
    millis(ts.checked_mul(1000)?)
}
