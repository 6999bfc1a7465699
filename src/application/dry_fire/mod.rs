//! Paper-trading path.
//!
//! - [`DryFireSimulator`] - Safety, risk and validation stages over one opportunity
//! - [`DryFireStats`] - Aggregates derived by replaying the trade log
//! - [`DryFireQuery`] - Since / venue / status filtering
//! - [`export_csv`] - Fixed-column audit export

mod export;
mod query;
mod simulator;
mod stats;

pub use export::{export_csv, CSV_COLUMNS};
pub use query::DryFireQuery;
pub use simulator::{DryFireSimulator, RiskLimits, SafetyLimits, ValidationLimits};
pub use stats::{DryFireStats, ProfitBucket, PROFIT_BUCKETS};
