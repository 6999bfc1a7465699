//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for markets, price updates and opportunities
//! - [`transport`] - A scripted [`FeedTransport`](crate::port::outbound::feed::FeedTransport)
//!   and a recording connection observer

pub mod domain;
pub mod transport;
