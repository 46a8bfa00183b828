//! Strategy configuration.

use ladder_core::Price;
use ladder_levels::{DailyLimit, FeedSpec, RateOffset, StaticLevel, TwapConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::mirror::MirrorConfig;

/// `[strategy]` section: which strategy to run and its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// One of `buysell`, `sell`, `sell_twap`, `mirror`, `delete`.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub buysell: Option<BuySellConfig>,
    /// Same shape as `buysell`; buy-side fields are ignored.
    #[serde(default)]
    pub sell: Option<BuySellConfig>,
    #[serde(default)]
    pub sell_twap: Option<SellTwapStrategyConfig>,
    #[serde(default)]
    pub mirror: Option<MirrorConfig>,
}

fn default_name() -> String {
    "buysell".to_string()
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            buysell: None,
            sell: None,
            sell_twap: None,
            mirror: None,
        }
    }
}

/// Static ladder on one or both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuySellConfig {
    #[serde(default)]
    pub feed_a: FeedSpec,
    #[serde(default)]
    pub feed_b: FeedSpec,

    /// Fractional price drift allowed before an order is modified.
    #[serde(default = "default_tolerance")]
    pub price_tolerance: Decimal,

    /// Fractional amount drift allowed before an order is modified.
    #[serde(default = "default_tolerance")]
    pub amount_tolerance: Decimal,

    /// Base units each level's `amount` multiplier refers to.
    pub amount_of_a_base: Decimal,

    /// Offset for the sell side; the buy side applies its inverse.
    #[serde(default)]
    pub rate_offset: RateOffset,

    #[serde(default)]
    pub max_daily_sell: Option<DailyLimit>,
    /// Limit for the buy side, denominated in its own frame: `base` is the
    /// quote asset spent.
    #[serde(default)]
    pub max_daily_buy: Option<DailyLimit>,

    /// Asks below this are not placed.
    #[serde(default)]
    pub min_price: Option<Price>,

    pub levels: Vec<StaticLevel>,
}

/// TWAP selling with the buy side cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellTwapStrategyConfig {
    #[serde(default)]
    pub feed_a: FeedSpec,
    #[serde(default)]
    pub feed_b: FeedSpec,
    #[serde(default = "default_tolerance")]
    pub price_tolerance: Decimal,
    #[serde(default = "default_tolerance")]
    pub amount_tolerance: Decimal,
    #[serde(flatten)]
    pub twap: TwapConfig,
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 3)
}
