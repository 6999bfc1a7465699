//! Domain validation errors for core domain types.
//!
//! Returned by `try_new` constructors when an invariant is violated.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Prediction contract prices are quoted in cents and must lie in `0..=100`.
    #[error("prediction price must be within 0..=100 cents, got {price}")]
    PriceOutOfRange { price: Decimal },

    /// Decimal odds below or equal to 1.0 cannot pay out more than the stake.
    #[error("decimal odds must be greater than 1.0, got {odds}")]
    InvalidOdds { odds: Decimal },

    /// A reported opportunity must return more than it costs.
    #[error("guaranteed return {payout} must be greater than cost {cost}")]
    PayoutNotGreaterThanCost { payout: Decimal, cost: Decimal },

    #[error("stake must be positive, got {stake}")]
    NonPositiveStake { stake: Decimal },

    /// Event groups need at least two markets on distinct venues.
    #[error("event group needs {required} venues, got {actual}")]
    InsufficientVenues { required: usize, actual: usize },
}
