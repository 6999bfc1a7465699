//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! - [`outbound::feed`] - Streaming transport and venue wire codecs
//! - [`outbound::store`] - Shared key-value store and append-only log store

pub mod outbound;
