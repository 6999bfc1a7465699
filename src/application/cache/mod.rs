//! Live price cache.
//!
//! - [`PriceTable`] - The table itself; owned and mutated by exactly one task
//! - [`overlay`] - Rebuild market snapshots from catalog entries plus live prices

mod overlay;
mod price;

pub use overlay::{overlay, overlay_all};
pub use price::PriceTable;
