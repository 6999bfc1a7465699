//! Fee-aware arbitrage arithmetic across prediction and sportsbook legs.
//!
//! Regimes, selected by the two legs' kinds:
//!
//! | leg A       | leg B       | payout            | stake per leg                        |
//! |-------------|-------------|-------------------|--------------------------------------|
//! | prediction  | prediction  | `N` contracts     | `price/100 × N + fee`                |
//! | prediction  | sportsbook  | target payout `P` | `price/100 × P + fee` / `P / odds`   |
//! | sportsbook  | prediction  | target payout `P` | `P / odds` / `price/100 × P + fee`   |
//! | sportsbook  | sportsbook  | target payout `P` | `P / odds`                           |

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{FeeSchedule, Market, MarketKind, Side};

/// Fixed payout sizes used before balance sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculatorConfig {
    /// `N`: contracts bought per side when both legs are prediction markets.
    pub contract_count: Decimal,
    /// `P`: dollars returned whichever way the event resolves, for any
    /// pairing that involves a sportsbook leg.
    pub target_payout: Decimal,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            contract_count: dec!(100),
            target_payout: dec!(100),
        }
    }
}

/// One side of a candidate pair.
#[derive(Debug, Clone, Copy)]
pub struct LegInput<'a> {
    pub market: &'a Market,
    pub side: Side,
    pub fee: FeeSchedule,
}

impl<'a> LegInput<'a> {
    #[must_use]
    pub const fn new(market: &'a Market, side: Side, fee: FeeSchedule) -> Self {
        Self { market, side, fee }
    }

    fn price(&self) -> Decimal {
        self.market.price(self.side)
    }
}

/// Stake committed to one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegStake {
    /// Dollars, fee included.
    pub stake: Decimal,
    pub fee: Decimal,
    /// Contracts for prediction legs; 1 for a sportsbook bet.
    pub quantity: Decimal,
}

/// Result of [`ArbitrageCalculator::compute_arbitrage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrageComputation {
    pub total_cost: Decimal,
    pub guaranteed_return: Decimal,
    /// Percent; zero unless the return exceeds the cost.
    pub profit_margin: Decimal,
    pub leg_a: LegStake,
    pub leg_b: LegStake,
}

impl ArbitrageComputation {
    fn from_legs(leg_a: LegStake, leg_b: LegStake, guaranteed_return: Decimal) -> Self {
        let total_cost = leg_a.stake + leg_b.stake;
        let profit_margin = if guaranteed_return > total_cost && total_cost > Decimal::ZERO {
            (guaranteed_return - total_cost) / total_cost * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        Self {
            total_cost,
            guaranteed_return,
            profit_margin,
            leg_a,
            leg_b,
        }
    }

    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.guaranteed_return > self.total_cost && self.total_cost > Decimal::ZERO
    }

    #[must_use]
    pub fn expected_profit(&self) -> Decimal {
        self.guaranteed_return - self.total_cost
    }
}

/// Stateless calculator over a fixed payout configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArbitrageCalculator {
    config: CalculatorConfig,
}

impl ArbitrageCalculator {
    #[must_use]
    pub const fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Stakes, fees, cost and margin at the configured payout.
    #[must_use]
    pub fn compute_arbitrage(&self, a: &LegInput<'_>, b: &LegInput<'_>) -> ArbitrageComputation {
        let payout = if both_prediction(a, b) {
            self.config.contract_count
        } else {
            self.config.target_payout
        };
        compute_for_payout(a, b, payout)
    }

    /// Scale a computation down (never up) so neither leg exceeds its
    /// per-venue maximum bet.
    ///
    /// The scale factor is `min(max_a / stake_a, max_b / stake_b, 1)`. When a
    /// prediction leg is involved the scaled payout is floored to whole
    /// contracts and the stakes are recomputed with fees; sportsbook legs
    /// stay a single bet with a scaled stake.
    #[must_use]
    pub fn size(
        &self,
        a: &LegInput<'_>,
        b: &LegInput<'_>,
        computation: &ArbitrageComputation,
        max_bet_a: Option<Decimal>,
        max_bet_b: Option<Decimal>,
    ) -> ArbitrageComputation {
        let scale = [
            ratio(max_bet_a, computation.leg_a.stake),
            ratio(max_bet_b, computation.leg_b.stake),
        ]
        .into_iter()
        .flatten()
        .fold(Decimal::ONE, Decimal::min);

        if scale >= Decimal::ONE {
            return *computation;
        }

        let whole_contracts = a.market.kind() == MarketKind::Prediction
            || b.market.kind() == MarketKind::Prediction;
        let mut payout = computation.guaranteed_return * scale.max(Decimal::ZERO);
        if whole_contracts {
            payout = payout.floor();
        }

        let mut sized = compute_for_payout(a, b, payout);
        // Rounded-up fees can push a floored leg a cent over its cap.
        while whole_contracts
            && payout > Decimal::ZERO
            && (exceeds(max_bet_a, sized.leg_a.stake) || exceeds(max_bet_b, sized.leg_b.stake))
        {
            payout -= Decimal::ONE;
            sized = compute_for_payout(a, b, payout);
        }
        sized
    }
}

fn both_prediction(a: &LegInput<'_>, b: &LegInput<'_>) -> bool {
    a.market.kind() == MarketKind::Prediction && b.market.kind() == MarketKind::Prediction
}

fn compute_for_payout(a: &LegInput<'_>, b: &LegInput<'_>, payout: Decimal) -> ArbitrageComputation {
    ArbitrageComputation::from_legs(stake_for(a, payout), stake_for(b, payout), payout)
}

fn stake_for(leg: &LegInput<'_>, payout: Decimal) -> LegStake {
    if payout <= Decimal::ZERO {
        return LegStake::default();
    }
    match leg.market.kind() {
        MarketKind::Prediction => {
            let fee = leg.fee.fee(leg.price(), payout);
            LegStake {
                stake: leg.price() / Decimal::ONE_HUNDRED * payout + fee,
                fee,
                quantity: payout,
            }
        }
        MarketKind::Sportsbook => LegStake {
            stake: if leg.price().is_zero() {
                Decimal::ZERO
            } else {
                payout / leg.price()
            },
            fee: Decimal::ZERO,
            quantity: Decimal::ONE,
        },
    }
}

fn ratio(max_bet: Option<Decimal>, stake: Decimal) -> Option<Decimal> {
    let max_bet = max_bet?;
    (stake > Decimal::ZERO).then(|| (max_bet / stake).max(Decimal::ZERO))
}

fn exceeds(max_bet: Option<Decimal>, stake: Decimal) -> bool {
    max_bet.is_some_and(|max| stake > max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn prediction(venue: &str, yes: Decimal, no: Decimal) -> Market {
        Market::prediction(venue, "m", "t", yes, no, Utc::now()).unwrap()
    }

    fn sportsbook(yes: Decimal, no: Decimal) -> Market {
        Market::sportsbook("book", "e", "t", yes, no, Utc::now()).unwrap()
    }

    #[test]
    fn both_prediction_uses_contract_count() {
        let a = prediction("polymarket", dec!(35), dec!(65));
        let b = prediction("kalshi", dec!(70), dec!(30));
        let calc = ArbitrageCalculator::default();

        let result = calc.compute_arbitrage(
            &LegInput::new(&a, Side::Yes, FeeSchedule::Zero),
            &LegInput::new(&b, Side::No, FeeSchedule::Kalshi),
        );

        assert_eq!(result.leg_a.stake, dec!(35));
        assert_eq!(result.leg_b.fee, dec!(1.47));
        assert_eq!(result.leg_b.stake, dec!(31.47));
        assert_eq!(result.total_cost, dec!(66.47));
        assert_eq!(result.guaranteed_return, dec!(100));
        assert!(result.is_profitable());
        assert!(result.profit_margin > dec!(50));
    }

    #[test]
    fn margin_is_zero_when_cost_meets_return() {
        let a = prediction("polymarket", dec!(30), dec!(70));
        let b = prediction("kalshi", dec!(28), dec!(72));
        let edge = ArbitrageCalculator::default().compute_arbitrage(
            &LegInput::new(&a, Side::No, FeeSchedule::Zero),
            &LegInput::new(&b, Side::Yes, FeeSchedule::Zero),
        );
        assert_eq!(edge.total_cost, dec!(98));
        assert!(edge.is_profitable());

        let b = prediction("kalshi", dec!(30), dec!(70));
        let flat = ArbitrageCalculator::default().compute_arbitrage(
            &LegInput::new(&a, Side::No, FeeSchedule::Zero),
            &LegInput::new(&b, Side::Yes, FeeSchedule::Zero),
        );
        assert_eq!(flat.total_cost, dec!(100));
        assert_eq!(flat.profit_margin, Decimal::ZERO);
        assert!(!flat.is_profitable());
    }

    #[test]
    fn prediction_plus_sportsbook_uses_target_payout() {
        let a = prediction("polymarket", dec!(40), dec!(60));
        let b = sportsbook(dec!(1.5), dec!(2.0));
        let result = ArbitrageCalculator::default().compute_arbitrage(
            &LegInput::new(&a, Side::Yes, FeeSchedule::Zero),
            &LegInput::new(&b, Side::No, FeeSchedule::Zero),
        );

        assert_eq!(result.leg_a.stake, dec!(40));
        assert_eq!(result.leg_a.quantity, dec!(100));
        assert_eq!(result.leg_b.stake, dec!(50));
        assert_eq!(result.leg_b.quantity, Decimal::ONE);
        assert_eq!(result.total_cost, dec!(90));
    }

    #[test]
    fn both_sportsbook_exists_iff_stake_sum_below_payout() {
        let calc = ArbitrageCalculator::default();
        let profitable = sportsbook(dec!(2.1), dec!(2.1));
        let result = calc.compute_arbitrage(
            &LegInput::new(&profitable, Side::Yes, FeeSchedule::Zero),
            &LegInput::new(&profitable, Side::No, FeeSchedule::Zero),
        );
        assert_eq!(result.leg_a.stake, dec!(100) / dec!(2.1));
        assert!(result.is_profitable());

        let vigged = sportsbook(dec!(1.9), dec!(1.9));
        let result = calc.compute_arbitrage(
            &LegInput::new(&vigged, Side::Yes, FeeSchedule::Zero),
            &LegInput::new(&vigged, Side::No, FeeSchedule::Zero),
        );
        assert!(!result.is_profitable());
        assert_eq!(result.profit_margin, Decimal::ZERO);
    }

    #[test]
    fn sizing_scales_down_to_whole_contracts() {
        let a = prediction("polymarket", dec!(35), dec!(65));
        let b = prediction("kalshi", dec!(70), dec!(30));
        let leg_a = LegInput::new(&a, Side::Yes, FeeSchedule::Zero);
        let leg_b = LegInput::new(&b, Side::No, FeeSchedule::Zero);
        let calc = ArbitrageCalculator::default();
        let full = calc.compute_arbitrage(&leg_a, &leg_b);

        // 35 per 100 contracts on A; cap A at 10 dollars -> 28 contracts.
        let sized = calc.size(&leg_a, &leg_b, &full, Some(dec!(10)), None);
        assert_eq!(sized.leg_a.quantity, dec!(28));
        assert_eq!(sized.leg_b.quantity, dec!(28));
        assert_eq!(sized.leg_a.stake, dec!(9.80));
        assert_eq!(sized.guaranteed_return, dec!(28));
        assert!(sized.leg_a.stake <= dec!(10));
    }

    #[test]
    fn sizing_never_scales_up() {
        let a = prediction("polymarket", dec!(35), dec!(65));
        let b = prediction("kalshi", dec!(70), dec!(30));
        let leg_a = LegInput::new(&a, Side::Yes, FeeSchedule::Zero);
        let leg_b = LegInput::new(&b, Side::No, FeeSchedule::Zero);
        let calc = ArbitrageCalculator::default();
        let full = calc.compute_arbitrage(&leg_a, &leg_b);

        let sized = calc.size(&leg_a, &leg_b, &full, Some(dec!(10000)), Some(dec!(10000)));
        assert_eq!(sized, full);
    }

    #[test]
    fn sizing_keeps_sportsbook_as_single_bet() {
        let book = sportsbook(dec!(2.1), dec!(2.1));
        let leg_a = LegInput::new(&book, Side::Yes, FeeSchedule::Zero);
        let leg_b = LegInput::new(&book, Side::No, FeeSchedule::Zero);
        let calc = ArbitrageCalculator::default();
        let full = calc.compute_arbitrage(&leg_a, &leg_b);

        let sized = calc.size(&leg_a, &leg_b, &full, Some(dec!(10)), None);
        assert_eq!(sized.leg_a.quantity, Decimal::ONE);
        assert!(sized.leg_a.stake <= dec!(10.0000001));
        assert!(sized.guaranteed_return < full.guaranteed_return);
    }
}
