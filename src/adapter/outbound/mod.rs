//! Outbound adapters (driven side).

pub mod store;
pub mod venue;
pub mod websocket;
