//! Infrastructure configuration modules.

pub mod engine;
pub mod feed;
pub mod heartbeat;
pub mod logging;
pub mod settings;
pub mod store;
pub mod venue;

pub use settings::Config;
