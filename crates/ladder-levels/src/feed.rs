//! Price feeds and their composition.
//!
//! A ladder is centred on `feed_a / feed_b`. Feeds are built from config
//! through a [`FeedRegistry`] that owns the named ticker sources available
//! to this process.

use std::collections::HashMap;
use std::sync::Arc;

use ladder_core::{Price, TopOfBook};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LevelsError, LevelsResult};

/// Anything that can quote a single price.
#[cfg_attr(test, mockall::automock)]
pub trait PriceFeed: Send + Sync {
    fn price(&self) -> LevelsResult<Price>;
}

/// Source of best bid/ask for a market, e.g. a venue adapter.
pub trait TickerSource: Send + Sync {
    fn ticker(&self) -> LevelsResult<TopOfBook>;
}

/// Constant price.
#[derive(Debug, Clone, Copy)]
pub struct FixedFeed(pub Price);

impl PriceFeed for FixedFeed {
    fn price(&self) -> LevelsResult<Price> {
        Ok(self.0)
    }
}

/// Which side of a ticker to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceModifier {
    Ask,
    Bid,
    #[default]
    Mid,
}

/// Feed backed by a [`TickerSource`].
pub struct TickerFeed {
    name: String,
    source: Arc<dyn TickerSource>,
    modifier: PriceModifier,
}

impl TickerFeed {
    pub fn new(name: impl Into<String>, source: Arc<dyn TickerSource>, modifier: PriceModifier) -> Self {
        Self {
            name: name.into(),
            source,
            modifier,
        }
    }
}

impl PriceFeed for TickerFeed {
    fn price(&self) -> LevelsResult<Price> {
        let top = self.source.ticker()?;
        let missing = |what: &str| LevelsError::Feed(format!("{} has no {what}", self.name));
        let price = match self.modifier {
            PriceModifier::Ask => top.best_ask.ok_or_else(|| missing("ask"))?,
            PriceModifier::Bid => top.best_bid.ok_or_else(|| missing("bid"))?,
            PriceModifier::Mid => {
                let bid = top.best_bid.ok_or_else(|| missing("bid"))?;
                let ask = top.best_ask.ok_or_else(|| missing("ask"))?;
                Price::new((bid.inner() + ask.inner()) / rust_decimal::Decimal::TWO)
            }
        };
        debug!(feed = %self.name, modifier = ?self.modifier, %price, "ticker feed price");
        Ok(price)
    }
}

/// Ratio of two feeds: the price of A in units of B.
#[derive(Clone)]
pub struct FeedPair {
    feed_a: Arc<dyn PriceFeed>,
    feed_b: Arc<dyn PriceFeed>,
}

impl FeedPair {
    pub fn new(feed_a: Arc<dyn PriceFeed>, feed_b: Arc<dyn PriceFeed>) -> Self {
        Self { feed_a, feed_b }
    }

    /// Pair quoting B in units of A, used by the buy side.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            feed_a: Arc::clone(&self.feed_b),
            feed_b: Arc::clone(&self.feed_a),
        }
    }

    pub fn center_price(&self) -> LevelsResult<Price> {
        let a = self.feed_a.price()?;
        let b = self.feed_b.price()?;
        if !b.is_positive() {
            return Err(LevelsError::Feed(format!(
                "feed B returned non-positive price {b}"
            )));
        }
        Ok(Price::new(a.inner() / b.inner()))
    }
}

impl PriceFeed for FeedPair {
    fn price(&self) -> LevelsResult<Price> {
        self.center_price()
    }
}

/// Config description of one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeedSpec {
    Fixed {
        price: Price,
    },
    Ticker {
        source: String,
        #[serde(default)]
        modifier: PriceModifier,
    },
}

impl Default for FeedSpec {
    fn default() -> Self {
        Self::Fixed { price: Price::ONE }
    }
}

/// Named ticker sources, populated once at startup.
#[derive(Default, Clone)]
pub struct FeedRegistry {
    sources: HashMap<String, Arc<dyn TickerSource>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, source: Arc<dyn TickerSource>) {
        self.sources.insert(name.into(), source);
    }

    pub fn build(&self, spec: &FeedSpec) -> LevelsResult<Arc<dyn PriceFeed>> {
        match spec {
            FeedSpec::Fixed { price } => Ok(Arc::new(FixedFeed(*price))),
            FeedSpec::Ticker { source, modifier } => {
                let ticker = self.sources.get(source).ok_or_else(|| {
                    LevelsError::InvalidConfig(format!("unknown ticker source '{source}'"))
                })?;
                Ok(Arc::new(TickerFeed::new(
                    source.clone(),
                    Arc::clone(ticker),
                    *modifier,
                )))
            }
        }
    }

    pub fn build_pair(&self, a: &FeedSpec, b: &FeedSpec) -> LevelsResult<FeedPair> {
        Ok(FeedPair::new(self.build(a)?, self.build(b)?))
    }
}
