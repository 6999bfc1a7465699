//! The long-running detection worker.
//!
//! - [`Worker`] - Wires feeds, state, heartbeat and the scan loop together
//! - [`ScanCycle`] - One scan pass, testable without any feeds

mod cycle;
mod runtime;

pub use cycle::{CycleReport, ScanCycle};
pub use runtime::{RunSummary, Worker};
