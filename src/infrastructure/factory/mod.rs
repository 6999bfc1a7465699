//! Factory functions that build runtime components from [`Config`].
//!
//! # Submodules
//!
//! - [`engine`] - Scanner, simulator and registry construction
//! - [`feed`] - Codec and transport selection per venue
//! - [`store`] - Key-value and log store backends
//!
//! [`Config`]: crate::infrastructure::config::Config

pub mod engine;
pub mod feed;
pub mod store;
