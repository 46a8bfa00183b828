//! Update loop, venue access and fill tracking for the ladder bot.
//!
//! # Key Components
//!
//! - [`Trader`]: Tick loop driving a strategy against a venue
//! - [`Venue`]: Account queries and order submission ([`MockVenue`] for tests)
//! - [`PaperVenue`]: In-process venue for simulation
//! - [`FillTracker`]: Background poller dispatching fills to [`FillHandler`]s
//! - [`TradeLedger`]: Per-day executed volume for daily caps and TWAP pacing

pub mod error;
pub mod fills;
pub mod paper;
pub mod snapshot;
pub mod trader;
pub mod venue;

pub use error::{TraderError, TraderResult};
pub use fills::{FillHandler, FillTracker, LoggingFillHandler, TradeLedger};
pub use paper::{PaperConfig, PaperVenue};
pub use snapshot::{dependency_order, load_snapshot, DataKey};
pub use trader::{LoopStats, TickPhase, TickReport, Trader, TraderConfig};
pub use venue::{BoxFuture, DynVenue, MockVenue, Venue};
