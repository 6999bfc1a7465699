//! Builders for domain primitives used across tests.
//!
//! Concise factories for markets, price updates and opportunities so tests
//! focus on assertions rather than construction boilerplate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::application::calculator::{ArbitrageCalculator, CalculatorConfig, LegInput};
use crate::domain::{
    ArbitrageOpportunity, FeeSchedule, LivePriceUpdate, Market, OpportunityLeg, PriceKey, PriceSource,
    Side,
};

/// Prediction market priced in cents.
pub fn prediction(venue: &str, id: &str, title: &str, yes: Decimal, no: Decimal, as_of: DateTime<Utc>) -> Market {
    Market::prediction(venue, id, title, yes, no, as_of).expect("valid prediction prices")
}

/// Sportsbook market priced in decimal odds.
pub fn sportsbook(venue: &str, id: &str, title: &str, yes: Decimal, no: Decimal, as_of: DateTime<Utc>) -> Market {
    Market::sportsbook(venue, id, title, yes, no, as_of).expect("valid decimal odds")
}

/// Websocket price update for `{market}:{side}` on `venue`.
pub fn price_update(venue: &str, market: &str, side: Side, price: Decimal) -> LivePriceUpdate {
    let outcome = format!("{market}:{}", side.as_str().to_lowercase());
    LivePriceUpdate::new(
        PriceKey::new(venue, market, outcome),
        price,
        price / Decimal::ONE_HUNDRED,
        PriceSource::Websocket,
    )
}

/// A sized, fee-free opportunity buying `a` YES and `b` NO.
///
/// Panics if the pair is not profitable.
pub fn opportunity(a: &Market, b: &Market, match_score: f64, detected_at: DateTime<Utc>) -> ArbitrageOpportunity {
    let calculator = ArbitrageCalculator::new(CalculatorConfig::default());
    let leg_a = LegInput::new(a, Side::Yes, FeeSchedule::Zero);
    let leg_b = LegInput::new(b, Side::No, FeeSchedule::Zero);
    let computation = calculator.compute_arbitrage(&leg_a, &leg_b);
    let mut first = OpportunityLeg::from_market(a, Side::Yes, detected_at);
    first.stake = computation.leg_a.stake;
    first.fee = computation.leg_a.fee;
    first.quantity = computation.leg_a.quantity;
    let mut second = OpportunityLeg::from_market(b, Side::No, detected_at);
    second.stake = computation.leg_b.stake;
    second.fee = computation.leg_b.fee;
    second.quantity = computation.leg_b.quantity;
    ArbitrageOpportunity::try_new(
        first,
        second,
        computation.guaranteed_return,
        match_score,
        detected_at,
    )
    .expect("profitable opportunity")
}
