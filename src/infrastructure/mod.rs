//! Infrastructure layer.
//!
//! Configuration, wiring and the worker lifecycle. Nothing here decides
//! whether a pair is an arbitrage; that lives in [`crate::application`].
//!
//! # Submodules
//!
//! - [`catalog`] - Market catalog loading
//! - [`config`] - Configuration loading and validation
//! - [`factory`] - Component factory functions
//! - [`flags`] - Runtime feature flags read from the shared store
//! - [`worker`] - The detection worker and its scan loop

pub mod catalog;
pub mod config;
pub mod factory;
pub mod flags;
pub mod worker;
