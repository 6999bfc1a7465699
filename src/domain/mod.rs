//! Venue-agnostic domain types.
//!
//! Everything here is plain data plus the arithmetic that belongs to it
//! (fee schedules, implied probabilities). No I/O.

pub mod breaker;
pub mod dry_fire;
pub mod error;
pub mod event;
pub mod fee;
pub mod heartbeat;
pub mod id;
pub mod market;
pub mod opportunity;
pub mod price;

pub use breaker::CircuitBreakerState;
pub use dry_fire::{DryFireStatus, DryFireTradeLog, SafetySnapshot};
pub use event::{EventStatus, MatchedEventGroup, Sport};
pub use fee::FeeSchedule;
pub use heartbeat::{
    CacheSummary, ConnectionState, ShutdownInfo, VenueConnection, WorkerHeartbeat, WorkerState,
};
pub use id::{MarketId, OpportunityId, OutcomeId, VenueId};
pub use market::{Market, MarketKind, Side};
pub use opportunity::{ArbitrageOpportunity, OpportunityLeg};
pub use price::{CachedPrice, LivePriceUpdate, PriceKey, PriceSource, PriceView};
