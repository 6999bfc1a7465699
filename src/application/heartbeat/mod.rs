//! Worker state publication over the shared store.
//!
//! - [`HeartbeatPublisher`] - Overwrites the heartbeat key every interval
//! - [`HeartbeatReader`] - Stateless, classifying reader with its own clock

mod publisher;
mod reader;

pub use publisher::HeartbeatPublisher;
pub use reader::{HeartbeatReader, HeartbeatStatus, VenueView, WorkerStatus};

/// Well-known key the worker publishes under.
pub const DEFAULT_HEARTBEAT_KEY: &str = "worker:heartbeat";
