//! Venue wire formats.
//!
//! Each codec decodes its venue's frames into the three
//! [`FeedEvent`](crate::port::outbound::feed::FeedEvent) classes, in
//! venue-native price units (cents for prediction venues, decimal odds for
//! sportsbooks).

mod kalshi;
mod odds;
mod polymarket;

pub use kalshi::KalshiCodec;
pub use odds::OddsCodec;
pub use polymarket::PolymarketCodec;

use chrono::{DateTime, Utc};

use crate::port::outbound::feed::VenueCodec;

/// Build a codec by its configured name.
#[must_use]
pub fn codec_for(name: &str) -> Option<Box<dyn VenueCodec>> {
    match name {
        "polymarket" => Some(Box::new(PolymarketCodec::new())),
        "kalshi" => Some(Box::new(KalshiCodec::new())),
        "odds" => Some(Box::new(OddsCodec::new())),
        _ => None,
    }
}

impl VenueCodec for Box<dyn VenueCodec> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn subscribe(&self, instruments: &[String]) -> Vec<String> {
        (**self).subscribe(instruments)
    }

    fn unsubscribe(&self, instruments: &[String]) -> Vec<String> {
        (**self).unsubscribe(instruments)
    }

    fn decode(&self, text: &str) -> Result<Vec<crate::port::outbound::feed::FeedEvent>, crate::error::ParseError> {
        (**self).decode(text)
    }
}

fn millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}
