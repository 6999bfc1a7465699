//! Crossbook - live cross-venue arbitrage detection.
//!
//! Streams prices from prediction markets (cents) and sportsbooks (decimal
//! odds), matches equivalent markets across venues, and reports fee-aware
//! arbitrage pairs with the capture time of both legs. Nothing is ever
//! executed: every opportunity only goes through a dry-fire simulation.
//!
//! # Architecture
//!
//! Hexagonal layout, dependencies pointing inwards:
//!
//! - [`domain`] - Markets, quotes, opportunities, heartbeat and dry-fire records
//! - [`port`] - Traits for feed transports, venue codecs and stores
//! - [`application`] - Matcher, calculator, scanner, feed clients, state owner,
//!   heartbeat, journals and the dry-fire simulator
//! - [`adapter`] - WebSocket transport, venue codecs, store backends and the CLI
//! - [`infrastructure`] - Configuration, factories, runtime flags and the worker
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use crossbook::application::matcher::MarketMatcher;
//!
//! let matcher = MarketMatcher::default();
//! let a = matcher.parse("Will the Chiefs win Super Bowl LX?");
//! let b = matcher.parse("Chiefs to win Super Bowl LX");
//! let score = matcher.similarity(&a, &b);
//! assert!((0.0..=1.0).contains(&score));
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
