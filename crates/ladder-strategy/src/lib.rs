//! Trading strategies for the ladder bot.
//!
//! A [`Strategy`] turns a snapshot of balances and live orders into a list
//! of create/modify/delete operations. Most strategies are a
//! [`ComposeStrategy`] of two [`SideStrategy`] halves, each of which sees the
//! market as a seller of its own asset.
//!
//! ```text
//! Snapshot → prune_existing_offers → update_with_ops
//!              ├─ buy side  (SellSideStrategy | DeleteSideStrategy)
//!              └─ sell side (SellSideStrategy | DeleteSideStrategy)
//!                   ↓
//!              ordered operations (sell first when our bid would cross)
//! ```

pub mod compose;
pub mod config;
pub mod delete_side;
pub mod error;
pub mod factory;
pub mod mirror;
pub mod sell_side;
pub mod side;
pub mod strategy;

pub use compose::ComposeStrategy;
pub use config::{BuySellConfig, SellTwapStrategyConfig, StrategyConfig};
pub use delete_side::DeleteSideStrategy;
pub use error::{StrategyError, StrategyResult};
pub use factory::{build_strategy, StrategyContext, STRATEGY_NAMES};
pub use mirror::{MirrorConfig, MirrorStrategy};
pub use sell_side::SellSideStrategy;
pub use side::{SideStrategy, SideStrategyKind, SideUpdate};
pub use strategy::{Strategy, StrategyKind};
