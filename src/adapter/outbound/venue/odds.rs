//! Generic sportsbook odds feed.
//!
//! ```json
//! {"type":"odds","timestamp":"2025-12-25T20:00:00Z","updates":[{"outcome":"evt-1:home","price":"2.35"}]}
//! {"type":"trade","outcome":"evt-1:home","price":"2.30","stake":"50"}
//! ```
//!
//! Prices are decimal odds; each outcome is its own instrument.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::port::outbound::feed::{FeedEvent, VenueCodec};

const NAME: &str = "odds";

#[derive(Debug, Serialize)]
struct Control<'a> {
    action: &'static str,
    outcomes: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Message {
    Odds {
        timestamp: Option<DateTime<Utc>>,
        updates: Vec<OddsUpdate>,
    },
    Trade {
        outcome: String,
        price: Decimal,
        stake: Option<Decimal>,
        timestamp: Option<DateTime<Utc>>,
    },
    Heartbeat,
    Subscribed,
}

#[derive(Debug, Deserialize)]
struct OddsUpdate {
    outcome: String,
    price: Decimal,
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct OddsCodec;

impl OddsCodec {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn control(action: &'static str, instruments: &[String]) -> Vec<String> {
        serde_json::to_string(&Control {
            action,
            outcomes: instruments,
        })
        .into_iter()
        .collect()
    }
}

impl VenueCodec for OddsCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn subscribe(&self, instruments: &[String]) -> Vec<String> {
        Self::control("subscribe", instruments)
    }

    fn unsubscribe(&self, instruments: &[String]) -> Vec<String> {
        Self::control("unsubscribe", instruments)
    }

    fn decode(&self, text: &str) -> Result<Vec<FeedEvent>, ParseError> {
        let message: Message =
            serde_json::from_str(text).map_err(|e| ParseError::new(NAME, e.to_string()))?;
        Ok(match message {
            Message::Odds { timestamp, updates } => updates
                .into_iter()
                .map(|u| FeedEvent::Price {
                    instrument: u.outcome,
                    price: u.price,
                    captured_at: u.timestamp.or(timestamp),
                })
                .collect(),
            Message::Trade {
                outcome,
                price,
                stake,
                timestamp,
            } => vec![FeedEvent::Trade {
                instrument: outcome,
                price,
                size: stake,
                captured_at: timestamp,
            }],
            Message::Heartbeat | Message::Subscribed => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn odds_batch_decodes_per_outcome() {
        let text = r#"{"type":"odds","timestamp":"2025-12-25T20:00:00Z","updates":[
            {"outcome":"evt-1:home","price":"2.35"},
            {"outcome":"evt-1:away","price":1.7,"timestamp":"2025-12-25T20:00:01Z"}]}"#;
        let events = OddsCodec::new().decode(text).unwrap();
        assert_eq!(events.len(), 2);
        match (&events[0], &events[1]) {
            (
                FeedEvent::Price { price: home, captured_at: home_at, .. },
                FeedEvent::Price { price: away, captured_at: away_at, .. },
            ) => {
                assert_eq!(*home, dec!(2.35));
                assert_eq!(*away, dec!(1.7));
                assert!(away_at > home_at);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn heartbeats_decode_to_nothing_and_unknown_types_fail() {
        let codec = OddsCodec::new();
        assert!(codec.decode(r#"{"type":"heartbeat"}"#).unwrap().is_empty());
        assert!(codec.decode(r#"{"type":"lineup"}"#).is_err());
    }
}
