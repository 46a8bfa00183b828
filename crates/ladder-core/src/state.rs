//! Per-tick account state: balances, live orders and market books.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{CoreError, Result};
use crate::{Level, Offer, OrderSide, Price, Size};

/// Trading pair by asset code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    pub base: String,
    pub quote: String,
}

impl AssetPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// The pair seen by the seller on `side`: bids sell the quote asset.
    #[must_use]
    pub fn for_side(&self, side: OrderSide) -> Self {
        match side {
            OrderSide::Sell => self.clone(),
            OrderSide::Buy => Self::new(self.quote.clone(), self.base.clone()),
        }
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Holdings of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub available: Decimal,
    /// Maximum the account may hold; `None` is unlimited.
    #[serde(default)]
    pub trust_limit: Option<Decimal>,
}

impl AssetBalance {
    pub fn new(available: Decimal, trust_limit: Option<Decimal>) -> Self {
        Self {
            available,
            trust_limit,
        }
    }

    pub fn unlimited(available: Decimal) -> Self {
        Self::new(available, None)
    }

    /// True when no more of this asset can be received.
    #[must_use]
    pub fn line_full(&self) -> bool {
        self.trust_limit.is_some_and(|limit| self.available >= limit)
    }
}

/// Balances keyed by asset code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances(HashMap<String, AssetBalance>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: impl Into<String>, balance: AssetBalance) {
        self.0.insert(asset.into(), balance);
    }

    /// Look up an asset that the snapshot is expected to contain.
    pub fn get(&self, asset: &str) -> Result<AssetBalance> {
        self.0
            .get(asset)
            .copied()
            .ok_or_else(|| CoreError::MissingBalance(asset.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AssetBalance)> {
        self.0.iter()
    }
}

/// Live orders split by side, each sorted best first.
///
/// Asks ascend by price; bids descend by price (ascending in the frame of
/// a seller of the quote asset).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveOrders {
    pub sell: Vec<Offer>,
    pub buy: Vec<Offer>,
}

impl LiveOrders {
    pub fn new(mut sell: Vec<Offer>, mut buy: Vec<Offer>) -> Self {
        sell.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id)));
        buy.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id)));
        Self { sell, buy }
    }

    /// Split a flat list of the account's orders by side.
    pub fn from_offers(offers: Vec<Offer>) -> Self {
        let (sell, buy): (Vec<_>, Vec<_>) =
            offers.into_iter().partition(|o| o.side == OrderSide::Sell);
        Self::new(sell, buy)
    }

    #[must_use]
    pub fn side(&self, side: OrderSide) -> &[Offer] {
        match side {
            OrderSide::Sell => &self.sell,
            OrderSide::Buy => &self.buy,
        }
    }

    #[must_use]
    pub fn best_sell(&self) -> Option<&Offer> {
        self.sell.first()
    }

    #[must_use]
    pub fn best_buy(&self) -> Option<&Offer> {
        self.buy.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sell.len() + self.buy.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sell.is_empty() && self.buy.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offer> {
        self.sell.iter().chain(self.buy.iter())
    }

    pub fn clear(&mut self) {
        self.sell.clear();
        self.buy.clear();
    }
}

/// Everything a strategy may read during one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub balances: Balances,
    pub live: LiveOrders,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(balances: Balances, live: LiveOrders, taken_at: DateTime<Utc>) -> Self {
        Self {
            balances,
            live,
            taken_at,
        }
    }
}

/// Best prices of an external or simulated book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
}

impl TopOfBook {
    /// Whether a resting order at `price` on `side` would take liquidity.
    #[must_use]
    pub fn crosses(&self, side: OrderSide, price: Price) -> bool {
        match side {
            OrderSide::Sell => self.best_bid.is_some_and(|bid| price <= bid),
            OrderSide::Buy => self.best_ask.is_some_and(|ask| price >= ask),
        }
    }
}

/// Depth snapshot, each side best first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
}

impl OrderBook {
    #[must_use]
    pub fn top(&self) -> TopOfBook {
        TopOfBook {
            best_bid: self.bids.first().map(|l| l.price),
            best_ask: self.asks.first().map(|l| l.price),
        }
    }
}

/// An executed fill against one of the account's orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Monotonic cursor assigned by the venue.
    pub seq: u64,
    pub side: OrderSide,
    pub price: Price,
    pub amount: Size,
    pub executed_at: DateTime<Utc>,
}
