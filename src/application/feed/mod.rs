//! Per-venue streaming feed client.
//!
//! - [`FeedClient`] - Connection state machine; one task per venue
//! - [`FeedHandle`] - Cloneable control surface for a running client
//! - [`Backoff`] - Reconnect delay schedule
//! - [`Subscription`] - Maps a venue instrument onto a market outcome
//! - [`ConnectionObserver`] - State-change listeners with per-handler isolation

mod backoff;
mod client;
mod dispatch;
mod observer;
mod subscription;

pub use backoff::Backoff;
pub use client::{FeedClient, FeedClientConfig, FeedHandle};
pub use dispatch::price_updates;
pub use observer::{BreakerObserver, ConnectionObserver, ObserverSet, StateChange};
pub use subscription::{Subscription, SubscriptionSet};
