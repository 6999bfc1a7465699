//! CSV export of dry-fire records.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{DryFireTradeLog, OpportunityLeg};

/// Header row, in output order.
pub const CSV_COLUMNS: [&str; 39] = [
    "opportunity_id",
    "logged_at",
    "detected_at",
    "status",
    "reasons",
    "venue_a",
    "market_a",
    "outcome_a",
    "side_a",
    "price_a",
    "implied_a",
    "odds_as_of_a",
    "age_ms_a",
    "stake_a",
    "fee_a",
    "quantity_a",
    "venue_b",
    "market_b",
    "outcome_b",
    "side_b",
    "price_b",
    "implied_b",
    "odds_as_of_b",
    "age_ms_b",
    "stake_b",
    "fee_b",
    "quantity_b",
    "time_skew_ms",
    "max_price_age_ms",
    "estimated_slippage",
    "combined_implied_probability",
    "breaker_open",
    "total_cost",
    "guaranteed_return",
    "expected_profit",
    "profit_margin",
    "match_score",
    "title_a",
    "title_b",
];

/// Render records as CSV with a header row.
#[must_use]
pub fn export_csv(logs: &[DryFireTradeLog]) -> String {
    let mut csv = CSV_COLUMNS.join(",");
    csv.push('\n');

    for log in logs {
        let mut row: Vec<String> = vec![
            log.opportunity_id.to_string(),
            timestamp(log.logged_at),
            timestamp(log.detected_at),
            log.status.to_string(),
            escape(&log.reasons.join("; ")),
        ];
        row.extend(leg_fields(&log.leg_a));
        row.extend(leg_fields(&log.leg_b));
        row.extend([
            log.time_skew_ms().to_string(),
            log.safety.max_price_age_ms.to_string(),
            log.safety.estimated_slippage.round_dp(6).to_string(),
            log.safety.combined_implied_probability.round_dp(6).to_string(),
            log.safety.breaker_open.to_string(),
            log.total_cost.round_dp(4).to_string(),
            log.guaranteed_return.round_dp(4).to_string(),
            log.expected_profit.round_dp(4).to_string(),
            log.profit_margin.round_dp(4).to_string(),
            format!("{:.4}", log.match_score),
            escape(&log.leg_a.title),
            escape(&log.leg_b.title),
        ]);
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

fn leg_fields(leg: &OpportunityLeg) -> [String; 11] {
    [
        escape(leg.venue.as_str()),
        escape(leg.market_id.as_str()),
        escape(leg.outcome_id.as_str()),
        leg.side.to_string(),
        leg.price.to_string(),
        leg.implied_probability.round_dp(6).to_string(),
        timestamp(leg.odds_as_of),
        leg.age_ms.to_string(),
        leg.stake.round_dp(4).to_string(),
        leg.fee.to_string(),
        leg.quantity.to_string(),
    ]
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
