//! Submit filters for the ladder bot.
//!
//! Filters see the strategy's proposed operations together with the live
//! orders they would change. Each filter may keep, rewrite or drop a
//! proposal; resting offers that no longer pass are deleted. The merge in
//! [`filter_ops`] keeps the order of the strategy's operations intact.

pub mod constraints;
pub mod error;
pub mod maker_mode;
pub mod merge;
pub mod pipeline;
pub mod price_band;

pub use constraints::OrderConstraintsFilter;
pub use error::{FilterError, FilterResult};
pub use maker_mode::{MakerModeConfig, MakerModeFilter};
pub use merge::{filter_ops, FilterCounter, Verdict};
pub use pipeline::{FilterConfig, FilterPipeline, SubmitFilter};
pub use price_band::{PriceBandConfig, PriceBandFilter};
