//! The level provider capability and its closed set of variants.

use ladder_core::Level;
use rust_decimal::Decimal;

use crate::error::LevelsResult;
use crate::static_spread::StaticSpreadLevelProvider;
use crate::twap::SellTwapLevelProvider;

/// Turns market data and risk configuration into a ladder, best level first.
///
/// `max_base` and `max_quote` are the balances of the asset being sold and
/// the asset being received, in the seller frame of the owning side.
pub trait LevelProvider: Send {
    fn get_levels(&mut self, max_base: Decimal, max_quote: Decimal) -> LevelsResult<Vec<Level>>;
}

/// Every provider the engine knows how to run.
pub enum LevelProviderKind {
    StaticSpread(StaticSpreadLevelProvider),
    SellTwap(SellTwapLevelProvider),
}

impl LevelProviderKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StaticSpread(_) => "static_spread",
            Self::SellTwap(_) => "sell_twap",
        }
    }
}

impl LevelProvider for LevelProviderKind {
    fn get_levels(&mut self, max_base: Decimal, max_quote: Decimal) -> LevelsResult<Vec<Level>> {
        match self {
            Self::StaticSpread(p) => p.get_levels(max_base, max_quote),
            Self::SellTwap(p) => p.get_levels(max_base, max_quote),
        }
    }
}

impl From<StaticSpreadLevelProvider> for LevelProviderKind {
    fn from(p: StaticSpreadLevelProvider) -> Self {
        Self::StaticSpread(p)
    }
}

impl From<SellTwapLevelProvider> for LevelProviderKind {
    fn from(p: SellTwapLevelProvider) -> Self {
        Self::SellTwap(p)
    }
}
