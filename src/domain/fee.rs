//! Venue fee schedules for prediction contracts.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Fee model applied to a prediction-market leg.
///
/// Sportsbook legs carry their margin inside the odds and use [`FeeSchedule::Zero`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeSchedule {
    /// No trading fee.
    #[default]
    Zero,
    /// `ceil(0.07 × C × P × (1 − P))` dollars, rounded up to the next cent,
    /// where `C` is the contract count and `P` the price in dollars.
    Kalshi,
}

impl FeeSchedule {
    /// Fee in dollars for buying `contracts` at `price_cents`.
    #[must_use]
    pub fn fee(self, price_cents: Decimal, contracts: Decimal) -> Decimal {
        match self {
            Self::Zero => Decimal::ZERO,
            Self::Kalshi => {
                if contracts <= Decimal::ZERO {
                    return Decimal::ZERO;
                }
                let p = price_cents / Decimal::ONE_HUNDRED;
                let raw = dec!(0.07) * contracts * p * (Decimal::ONE - p);
                raw.max(Decimal::ZERO)
                    .round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity)
            }
        }
    }
}
