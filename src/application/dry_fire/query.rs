use chrono::{DateTime, Utc};

use crate::domain::{DryFireStatus, DryFireTradeLog, VenueId};

/// Dry-fire log filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DryFireQuery {
    /// Inclusive lower bound on `logged_at`.
    pub since: Option<DateTime<Utc>>,
    pub venue: Option<VenueId>,
    pub status: Option<DryFireStatus>,
    pub limit: Option<usize>,
}

impl DryFireQuery {
    #[must_use]
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    #[must_use]
    pub fn venue(mut self, venue: impl Into<VenueId>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: DryFireStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn matches(&self, log: &DryFireTradeLog) -> bool {
        self.since.map_or(true, |since| log.logged_at >= since)
            && self.venue.as_ref().map_or(true, |venue| log.involves(venue))
            && self.status.map_or(true, |status| log.status == status)
    }

    /// Keep matching records in log order, up to `limit`.
    #[must_use]
    pub fn apply(&self, logs: Vec<DryFireTradeLog>) -> Vec<DryFireTradeLog> {
        logs.into_iter()
            .filter(|log| self.matches(log))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SafetySnapshot;
    use crate::testkit::domain::{opportunity, prediction};
    use chrono::Duration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn log(venue_b: &str, status: DryFireStatus, at: DateTime<Utc>) -> DryFireTradeLog {
        let a = prediction("kalshi", "a", "t", dec!(45), dec!(50), at);
        let b = prediction(venue_b, "b", "t", dec!(50), dec!(50), at);
        let opp = opportunity(&a, &b, 0.9, at);
        let safety = SafetySnapshot {
            max_price_age_ms: 0,
            time_skew_ms: 0,
            estimated_slippage: Decimal::ZERO,
            combined_implied_probability: opp.combined_implied_probability(),
            breaker_open: false,
        };
        DryFireTradeLog::new(&opp, status, Vec::new(), safety, at)
    }

    #[test]
    fn filters_compose() {
        let t0 = Utc::now();
        let logs = vec![
            log("polymarket", DryFireStatus::Simulated, t0),
            log("book", DryFireStatus::Simulated, t0 + Duration::minutes(5)),
            log("polymarket", DryFireStatus::RejectedByRisk, t0 + Duration::minutes(10)),
        ];

        let by_venue = DryFireQuery::default().venue("polymarket").apply(logs.clone());
        assert_eq!(by_venue.len(), 2);

        let recent_simulated = DryFireQuery::default()
            .since(t0 + Duration::minutes(1))
            .status(DryFireStatus::Simulated)
            .apply(logs.clone());
        assert_eq!(recent_simulated.len(), 1);
        assert_eq!(recent_simulated[0].leg_b.venue.as_str(), "book");

        let limited = DryFireQuery::default().limit(1).apply(logs);
        assert_eq!(limited.len(), 1);
    }
}
