//! Application services: the detection engine.
//!
//! Pure computation (matcher, calculator, scanner, registry, dry-fire) sits
//! next to the task-owning services (state, feed, heartbeat). Adapters plug
//! in only through the traits in [`crate::port`].

pub mod breaker;
pub mod cache;
pub mod calculator;
pub mod dry_fire;
pub mod feed;
pub mod heartbeat;
pub mod journal;
pub mod matcher;
pub mod registry;
pub mod scanner;
pub mod state;
