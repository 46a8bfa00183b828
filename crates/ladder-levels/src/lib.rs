//! Level providers for the ladder market maker.
//!
//! A level provider turns market data and risk configuration into a ladder
//! of `(price, amount)` levels, best first:
//! - `StaticSpreadLevelProvider`: fixed spreads around a feed price, with an
//!   optional daily limit
//! - `SellTwapLevelProvider`: one time-paced child order per tick
//!
//! Prices come from `PriceFeed`s combined into a `FeedPair`; executed volume
//! comes from a `DailyVolumeSource`.

pub mod error;
pub mod feed;
pub mod offset;
pub mod provider;
pub mod static_spread;
pub mod twap;
pub mod volume;

pub use error::{LevelsError, LevelsResult};
pub use feed::{
    FeedPair, FeedRegistry, FeedSpec, FixedFeed, PriceFeed, PriceModifier, TickerFeed,
    TickerSource,
};
pub use offset::RateOffset;
pub use provider::{LevelProvider, LevelProviderKind};
pub use static_spread::{StaticLevel, StaticSpreadLevelProvider};
pub use twap::{SellTwapLevelProvider, TwapConfig};
pub use volume::{CapAsset, DailyLimit, DailyVolume, DailyVolumeSource};
