//! Aggregates replayed from the dry-fire log.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::domain::{DryFireStatus, DryFireTradeLog, VenueId};

/// Profit-margin histogram edges in percent. The last bucket is open-ended.
pub const PROFIT_BUCKETS: [Decimal; 5] = [dec!(0), dec!(1), dec!(2), dec!(5), dec!(10)];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitBucket {
    pub label: String,
    pub count: usize,
}

/// Dry-fire summary.
///
/// Never maintained incrementally; every value is recomputed from the log
/// records passed to [`DryFireStats::replay`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DryFireStats {
    pub total: usize,
    pub by_status: BTreeMap<DryFireStatus, usize>,
    /// Records that involve each venue on either leg.
    pub by_venue: BTreeMap<VenueId, usize>,
    pub profit_buckets: Vec<ProfitBucket>,
    /// Sum of expected profit over `SIMULATED` records.
    pub simulated_profit: Decimal,
    pub average_margin: Option<Decimal>,
}

impl DryFireStats {
    pub fn replay<'a>(logs: impl IntoIterator<Item = &'a DryFireTradeLog>) -> Self {
        let mut by_status: BTreeMap<DryFireStatus, usize> =
            DryFireStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut by_venue: BTreeMap<VenueId, usize> = BTreeMap::new();
        let mut buckets = vec![0usize; PROFIT_BUCKETS.len()];
        let mut total = 0usize;
        let mut simulated_profit = Decimal::ZERO;
        let mut margin_sum = Decimal::ZERO;

        for log in logs {
            total += 1;
            *by_status.entry(log.status).or_default() += 1;
            *by_venue.entry(log.leg_a.venue.clone()).or_default() += 1;
            if log.leg_b.venue != log.leg_a.venue {
                *by_venue.entry(log.leg_b.venue.clone()).or_default() += 1;
            }
            if let Some(index) = bucket_index(log.profit_margin) {
                buckets[index] += 1;
            }
            if log.status == DryFireStatus::Simulated {
                simulated_profit += log.expected_profit;
            }
            margin_sum += log.profit_margin;
        }

        let profit_buckets = buckets
            .into_iter()
            .enumerate()
            .map(|(index, count)| ProfitBucket {
                label: bucket_label(index),
                count,
            })
            .collect();

        Self {
            total,
            by_status,
            by_venue,
            profit_buckets,
            simulated_profit,
            average_margin: (total > 0).then(|| margin_sum / Decimal::from(total)),
        }
    }

    #[must_use]
    pub fn count(&self, status: DryFireStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or_default()
    }
}

fn bucket_index(margin: Decimal) -> Option<usize> {
    PROFIT_BUCKETS.iter().rposition(|lower| margin >= *lower)
}

fn bucket_label(index: usize) -> String {
    match PROFIT_BUCKETS.get(index + 1) {
        Some(upper) => format!("{}-{}%", PROFIT_BUCKETS[index], upper),
        None => format!("{}%+", PROFIT_BUCKETS[index]),
    }
}
