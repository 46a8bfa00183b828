//! Core domain types for the ladder market maker.
//!
//! This crate provides fundamental types used throughout the engine:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `Offer`, `Operation`: Live orders and the mutations proposed for them
//! - `Level`, `OrderConstraints`: Ladder rungs and venue precision
//! - `Snapshot`: Balances and live orders captured once per tick
//! - `Clock`, `OrderBookSource`: Injectable time and market data sources

pub mod clock;
pub mod decimal;
pub mod error;
pub mod level;
pub mod market;
pub mod order;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock, SECONDS_PER_DAY};
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use level::{Level, OrderConstraints};
pub use market::OrderBookSource;
pub use order::{Offer, OfferId, Operation, OperationKind, OrderSide};
pub use state::{
    AssetBalance, AssetPair, Balances, LiveOrders, OrderBook, Snapshot, TopOfBook, Trade,
};
