//! Feed event → cache update translation.

use rust_decimal::Decimal;

use super::subscription::Subscription;
use crate::domain::market::implied_probability;
use crate::domain::{LivePriceUpdate, MarketKind, OutcomeId, PriceKey, PriceSource, VenueId};
use crate::port::outbound::feed::FeedEvent;

/// Cache updates produced by one event for one subscription.
///
/// Orderbook events price at the mid of best bid/ask, or whichever side is
/// present. Prediction subscriptions with a complement also yield the
/// mirrored `100 - price` update for the other outcome. Out-of-range book
/// levels are ignored and out-of-range prices yield nothing.
#[must_use]
pub fn price_updates(venue: &VenueId, subscription: &Subscription, event: &FeedEvent) -> Vec<LivePriceUpdate> {
    let (price, best_bid, best_ask, captured_at) = match event {
        FeedEvent::Orderbook {
            best_bid,
            best_ask,
            captured_at,
            ..
        } => {
            let best_bid = best_bid.filter(|bid| in_range(subscription.kind, *bid));
            let best_ask = best_ask.filter(|ask| in_range(subscription.kind, *ask));
            let mid = match (best_bid, best_ask) {
                (Some(bid), Some(ask)) => bid.checked_add(ask).and_then(|sum| sum.checked_div(Decimal::TWO)),
                (Some(bid), None) => Some(bid),
                (None, Some(ask)) => Some(ask),
                (None, None) => None,
            };
            let Some(mid) = mid else {
                return Vec::new();
            };
            (mid, best_bid, best_ask, *captured_at)
        }
        FeedEvent::Price {
            price, captured_at, ..
        }
        | FeedEvent::Trade {
            price, captured_at, ..
        } => (*price, None, None, *captured_at),
    };

    if !in_range(subscription.kind, price) {
        return Vec::new();
    }

    let mut updates = vec![update(
        venue,
        subscription,
        &subscription.outcome_id,
        price,
        best_bid,
        best_ask,
        captured_at,
    )];

    if let (MarketKind::Prediction, Some(complement)) = (subscription.kind, &subscription.complement) {
        let mirror = |value: Option<Decimal>| value.map(|v| Decimal::ONE_HUNDRED - v);
        updates.push(update(
            venue,
            subscription,
            complement,
            Decimal::ONE_HUNDRED - price,
            mirror(best_ask),
            mirror(best_bid),
            captured_at,
        ));
    }
    updates
}

fn update(
    venue: &VenueId,
    subscription: &Subscription,
    outcome: &OutcomeId,
    price: Decimal,
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
    captured_at: Option<chrono::DateTime<chrono::Utc>>,
) -> LivePriceUpdate {
    let key = PriceKey::new(venue.clone(), subscription.market_id.clone(), outcome.clone());
    let mut update = LivePriceUpdate::new(
        key,
        price,
        implied_probability(subscription.kind, price),
        PriceSource::Websocket,
    )
    .with_book(best_bid, best_ask);
    update.captured_at = captured_at;
    update
}

fn in_range(kind: MarketKind, price: Decimal) -> bool {
    match kind {
        MarketKind::Prediction => price >= Decimal::ZERO && price <= Decimal::ONE_HUNDRED,
        MarketKind::Sportsbook => price > Decimal::ONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Market;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn subscription(kind: MarketKind) -> Subscription {
        let market = match kind {
            MarketKind::Prediction => {
                Market::prediction("kalshi", "KX-1", "t", dec!(50), dec!(50), Utc::now()).unwrap()
            }
            MarketKind::Sportsbook => {
                Market::sportsbook("book", "e1", "t", dec!(2), dec!(2), Utc::now()).unwrap()
            }
        };
        Subscription::with_complement("KX-1", &market)
    }

    #[test]
    fn orderbook_mid_with_complement() {
        let venue = VenueId::from("kalshi");
        let now = Utc::now();
        let event = FeedEvent::Orderbook {
            instrument: "KX-1".into(),
            best_bid: Some(dec!(40)),
            best_ask: Some(dec!(44)),
            captured_at: Some(now),
        };
        let updates = price_updates(&venue, &subscription(MarketKind::Prediction), &event);

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].key.outcome_id.as_str(), "KX-1:yes");
        assert_eq!(updates[0].price, dec!(42));
        assert_eq!(updates[0].spread, Some(dec!(4)));
        assert_eq!(updates[0].captured_at, Some(now));
        assert_eq!(updates[1].key.outcome_id.as_str(), "KX-1:no");
        assert_eq!(updates[1].price, dec!(58));
        assert_eq!(updates[1].best_bid, Some(dec!(56)));
        assert_eq!(updates[1].best_ask, Some(dec!(60)));
    }

    #[test]
    fn one_sided_book_uses_present_side() {
        let event = FeedEvent::Orderbook {
            instrument: "KX-1".into(),
            best_bid: None,
            best_ask: Some(dec!(61)),
            captured_at: None,
        };
        let updates = price_updates(&"kalshi".into(), &subscription(MarketKind::Prediction), &event);
        assert_eq!(updates[0].price, dec!(61));
        assert_eq!(updates[0].spread, None);
    }

    #[test]
    fn empty_book_yields_nothing() {
        let event = FeedEvent::Orderbook {
            instrument: "KX-1".into(),
            best_bid: None,
            best_ask: None,
            captured_at: None,
        };
        assert!(price_updates(&"kalshi".into(), &subscription(MarketKind::Prediction), &event).is_empty());
    }

    #[test]
    fn sportsbook_price_has_no_complement() {
        let event = FeedEvent::Price {
            instrument: "KX-1".into(),
            price: dec!(2.5),
            captured_at: None,
        };
        let updates = price_updates(&"book".into(), &subscription(MarketKind::Sportsbook), &event);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].implied_probability, dec!(0.4));
    }

    #[test]
    fn out_of_range_book_levels_are_ignored() {
        let event = FeedEvent::Orderbook {
            instrument: "KX-1".into(),
            best_bid: Some(Decimal::MAX),
            best_ask: Some(Decimal::MAX),
            captured_at: None,
        };
        assert!(price_updates(&"kalshi".into(), &subscription(MarketKind::Prediction), &event).is_empty());

        let wide = FeedEvent::Orderbook {
            instrument: "KX-1".into(),
            best_bid: Some(dec!(40)),
            best_ask: Some(Decimal::MAX),
            captured_at: None,
        };
        let updates = price_updates(&"kalshi".into(), &subscription(MarketKind::Prediction), &wide);
        assert_eq!(updates[0].price, dec!(40));
        assert_eq!(updates[0].best_ask, None);
        assert_eq!(updates[1].price, dec!(60));
        assert_eq!(updates[1].best_ask, Some(dec!(60)));
    }

    #[test]
    fn out_of_range_prices_are_dropped() {
        let event = FeedEvent::Trade {
            instrument: "KX-1".into(),
            price: dec!(140),
            size: None,
            captured_at: None,
        };
        assert!(price_updates(&"kalshi".into(), &subscription(MarketKind::Prediction), &event).is_empty());
    }
}
