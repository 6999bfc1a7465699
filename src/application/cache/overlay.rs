//! Market snapshots rebuilt from live cache prices.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::{CachedPrice, Market, MarketKind, PriceKey, PriceView, Side};

/// Rebuild `market` from the cache.
///
/// Prediction markets need at least one side; a missing side is the
/// complement of the other and shares its capture time. Sportsbook markets
/// need both sides. Each side keeps its own capture time and `odds_as_of` is
/// the older of the two.
#[must_use]
pub fn overlay(market: &Market, prices: &HashMap<PriceKey, CachedPrice>) -> Option<Market> {
    let lookup = |side: Side| {
        prices.get(&PriceKey {
            venue: market.venue().clone(),
            market_id: market.market_id().clone(),
            outcome_id: market.outcome(side).clone(),
        })
    };
    let yes = lookup(Side::Yes);
    let no = lookup(Side::No);

    let (yes_price, no_price, yes_at, no_at) = match (market.kind(), yes, no) {
        (_, Some(yes), Some(no)) => (yes.price, no.price, yes.captured_at, no.captured_at),
        (MarketKind::Prediction, Some(yes), None) => (
            yes.price,
            Decimal::ONE_HUNDRED - yes.price,
            yes.captured_at,
            yes.captured_at,
        ),
        (MarketKind::Prediction, None, Some(no)) => (
            Decimal::ONE_HUNDRED - no.price,
            no.price,
            no.captured_at,
            no.captured_at,
        ),
        _ => return None,
    };

    let snapshot = market.with_quote(yes_price, no_price, yes_at.min(no_at)).ok()?;
    Some(
        snapshot
            .with_capture_times(yes_at, no_at)
            .with_spreads(yes.and_then(|p| p.spread), no.and_then(|p| p.spread)),
    )
}

/// Overlay every catalog market that has live prices.
#[must_use]
pub fn overlay_all(catalog: &[Market], prices: &[PriceView]) -> Vec<Market> {
    let index: HashMap<PriceKey, CachedPrice> = prices
        .iter()
        .map(|view| (view.price.key.clone(), view.price.clone()))
        .collect();
    catalog
        .iter()
        .filter_map(|market| overlay(market, &index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LivePriceUpdate, PriceSource};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn cached(market: &Market, side: Side, price: Decimal, at: chrono::DateTime<Utc>) -> CachedPrice {
        let key = PriceKey {
            venue: market.venue().clone(),
            market_id: market.market_id().clone(),
            outcome_id: market.outcome(side).clone(),
        };
        let update = LivePriceUpdate::new(key, price, price / dec!(100), PriceSource::Websocket)
            .captured_at(at);
        CachedPrice::from_update(update, at)
    }

    #[test]
    fn uses_oldest_capture_time_of_both_sides() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::milliseconds(300);
        let catalog = Market::prediction("kalshi", "m", "t", dec!(50), dec!(50), t0 - Duration::hours(1)).unwrap();

        let mut prices = HashMap::new();
        for entry in [
            cached(&catalog, Side::Yes, dec!(41), t1),
            cached(&catalog, Side::No, dec!(60), t0),
        ] {
            prices.insert(entry.key.clone(), entry);
        }

        let snapshot = overlay(&catalog, &prices).unwrap();
        assert_eq!(snapshot.price(Side::Yes), dec!(41));
        assert_eq!(snapshot.price(Side::No), dec!(60));
        assert_eq!(snapshot.odds_as_of(), t0);
        assert_eq!(snapshot.side_as_of(Side::Yes), t1);
        assert_eq!(snapshot.side_as_of(Side::No), t0);
    }

    #[test]
    fn prediction_complements_a_missing_side() {
        let t0 = Utc::now();
        let catalog = Market::prediction("kalshi", "m", "t", dec!(50), dec!(50), t0).unwrap();
        let entry = cached(&catalog, Side::Yes, dec!(37), t0);
        let prices = HashMap::from([(entry.key.clone(), entry)]);

        let snapshot = overlay(&catalog, &prices).unwrap();
        assert_eq!(snapshot.price(Side::No), dec!(63));
    }

    #[test]
    fn sportsbook_requires_both_sides() {
        let t0 = Utc::now();
        let catalog = Market::sportsbook("book", "e", "t", dec!(2.0), dec!(2.0), t0).unwrap();
        let entry = cached(&catalog, Side::Yes, dec!(2.1), t0);
        let prices = HashMap::from([(entry.key.clone(), entry)]);

        assert!(overlay(&catalog, &prices).is_none());
    }
}
