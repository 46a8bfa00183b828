//! In-process paper venue.
//!
//! Holds balances and resting orders for one pair and fills them against a
//! reference price that the caller moves. Also serves as the ticker and
//! order book source for strategies running against it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ladder_core::{
    AssetBalance, AssetPair, Balances, Level, Offer, OfferId, Operation, OrderBook,
    OrderBookSource, OrderSide, Price, Size, TopOfBook, Trade,
};
use ladder_levels::{LevelsError, LevelsResult, TickerSource};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{TraderError, TraderResult};
use crate::venue::{BoxFuture, Venue};

/// `[paper]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperConfig {
    pub base_balance: Decimal,
    pub quote_balance: Decimal,
    /// Starting reference price in quote per base.
    pub reference_price: Price,
    /// Reject creates and modifies that would take liquidity.
    #[serde(default)]
    pub maker_only: bool,
    /// Half-spread of the synthetic book around the reference.
    #[serde(default = "default_slippage")]
    pub slippage: Decimal,
    /// Amount shown at each synthetic book level.
    #[serde(default = "default_level_amount")]
    pub level_amount: Decimal,
}

fn default_slippage() -> Decimal {
    Decimal::new(1, 3)
}

fn default_level_amount() -> Decimal {
    Decimal::from(1000)
}

#[derive(Debug, Clone)]
struct PaperState {
    base: Decimal,
    quote: Decimal,
    offers: BTreeMap<OfferId, Offer>,
    next_offer_id: u64,
    trades: Vec<Trade>,
    next_seq: u64,
    reference: Price,
}

pub struct PaperVenue {
    pair: AssetPair,
    config: PaperConfig,
    state: Mutex<PaperState>,
}

impl PaperVenue {
    pub fn new(pair: AssetPair, config: PaperConfig) -> TraderResult<Self> {
        if !config.reference_price.is_positive() {
            return Err(TraderError::ConfigError(
                "paper reference_price must be positive".to_string(),
            ));
        }
        if config.slippage < Decimal::ZERO || config.slippage >= Decimal::ONE {
            return Err(TraderError::ConfigError(format!(
                "paper slippage must be within [0, 1), got {}",
                config.slippage
            )));
        }
        let state = PaperState {
            base: config.base_balance,
            quote: config.quote_balance,
            offers: BTreeMap::new(),
            next_offer_id: 1,
            trades: Vec::new(),
            next_seq: 1,
            reference: config.reference_price,
        };
        Ok(Self {
            pair,
            config,
            state: Mutex::new(state),
        })
    }

    #[must_use]
    pub fn reference(&self) -> Price {
        self.state.lock().reference
    }

    pub fn set_reference(&self, price: Price) {
        self.state.lock().reference = price;
    }

    #[must_use]
    pub fn open_offers(&self) -> Vec<Offer> {
        self.state.lock().offers.values().cloned().collect()
    }

    /// Synthetic top of book: reference × (1 ± slippage).
    #[must_use]
    pub fn top(&self) -> TopOfBook {
        self.top_for(self.reference())
    }

    /// Move the reference to `price` and fill every resting order it
    /// crosses at the order's own price. Returns the new trades.
    pub fn match_price(&self, price: Price, at: DateTime<Utc>) -> Vec<Trade> {
        let mut state = self.state.lock();
        state.reference = price;

        let crossed: Vec<OfferId> = state
            .offers
            .values()
            .filter(|o| match o.side {
                OrderSide::Sell => o.price <= price,
                OrderSide::Buy => o.price >= price,
            })
            .map(|o| o.id)
            .collect();

        let mut trades = Vec::with_capacity(crossed.len());
        for id in crossed {
            let Some(offer) = state.offers.remove(&id) else {
                continue;
            };
            let notional = offer.amount.notional(offer.price);
            match offer.side {
                OrderSide::Sell => {
                    state.base -= offer.amount.inner();
                    state.quote += notional;
                }
                OrderSide::Buy => {
                    state.quote -= notional;
                    state.base += offer.amount.inner();
                }
            }
            let trade = Trade {
                seq: state.next_seq,
                side: offer.side,
                price: offer.price,
                amount: offer.amount,
                executed_at: at,
            };
            state.next_seq += 1;
            debug!(offer_id = %offer.id, side = %offer.side, price = %offer.price, amount = %offer.amount, "paper fill");
            state.trades.push(trade.clone());
            trades.push(trade);
        }
        trades
    }

    /// Apply `ops` to a copy of the state, then swap it in if every
    /// operation was valid and balances still cover all resting orders.
    fn apply(&self, ops: &[Operation]) -> TraderResult<()> {
        let mut state = self.state.lock();
        let mut next = state.clone();
        let top = self.top_for(next.reference);

        for op in ops {
            match op {
                Operation::Create {
                    side,
                    price,
                    amount,
                } => {
                    self.check_maker(&top, *side, *price)?;
                    let id = OfferId(next.next_offer_id);
                    next.next_offer_id += 1;
                    next.offers
                        .insert(id, Offer::new(id.0, *side, *price, *amount));
                }
                Operation::Modify {
                    offer_id,
                    side,
                    price,
                    amount,
                } => {
                    self.check_maker(&top, *side, *price)?;
                    let offer = next.offers.get_mut(offer_id).ok_or_else(|| {
                        TraderError::Rejected(format!("unknown offer {offer_id}"))
                    })?;
                    if offer.side != *side {
                        return Err(TraderError::Rejected(format!(
                            "offer {offer_id} is a {} order",
                            offer.side
                        )));
                    }
                    offer.price = *price;
                    offer.amount = *amount;
                }
                Operation::Delete { offer_id, .. } => {
                    next.offers.remove(offer_id).ok_or_else(|| {
                        TraderError::Rejected(format!("unknown offer {offer_id}"))
                    })?;
                }
            }
        }

        let (selling, buying) = next.offers.values().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(s, b), o| match o.side {
                OrderSide::Sell => (s + o.amount.inner(), b),
                OrderSide::Buy => (s, b + o.amount.notional(o.price)),
            },
        );
        if selling > next.base {
            return Err(TraderError::Rejected(format!(
                "sell orders need {selling} {} but only {} available",
                self.pair.base, next.base
            )));
        }
        if buying > next.quote {
            return Err(TraderError::Rejected(format!(
                "buy orders need {buying} {} but only {} available",
                self.pair.quote, next.quote
            )));
        }

        *state = next;
        Ok(())
    }

    fn top_for(&self, reference: Price) -> TopOfBook {
        TopOfBook {
            best_bid: Some(Price::new(reference.inner() * (Decimal::ONE - self.config.slippage))),
            best_ask: Some(Price::new(reference.inner() * (Decimal::ONE + self.config.slippage))),
        }
    }

    fn check_maker(&self, top: &TopOfBook, side: OrderSide, price: Price) -> TraderResult<()> {
        if self.config.maker_only && top.crosses(side, price) {
            return Err(TraderError::Rejected(format!(
                "{side} at {price} would take liquidity"
            )));
        }
        Ok(())
    }
}

impl Venue for PaperVenue {
    fn load_balances(&self) -> BoxFuture<'_, TraderResult<Balances>> {
        Box::pin(async move {
            let state = self.state.lock();
            let mut balances = Balances::new();
            balances.insert(self.pair.base.clone(), AssetBalance::unlimited(state.base));
            balances.insert(self.pair.quote.clone(), AssetBalance::unlimited(state.quote));
            Ok(balances)
        })
    }

    fn load_offers(&self) -> BoxFuture<'_, TraderResult<Vec<Offer>>> {
        Box::pin(async move { Ok(self.open_offers()) })
    }

    fn submit(&self, ops: Vec<Operation>) -> BoxFuture<'_, TraderResult<()>> {
        Box::pin(async move {
            self.apply(&ops)?;
            info!(ops = ops.len(), "paper venue applied operations");
            Ok(())
        })
    }

    fn trades_since(&self, cursor: Option<u64>) -> BoxFuture<'_, TraderResult<Vec<Trade>>> {
        Box::pin(async move {
            Ok(self
                .state
                .lock()
                .trades
                .iter()
                .filter(|t| cursor.map_or(true, |c| t.seq > c))
                .cloned()
                .collect())
        })
    }
}

impl TickerSource for PaperVenue {
    fn ticker(&self) -> LevelsResult<TopOfBook> {
        let top = self.top();
        if top.best_bid.is_none() || top.best_ask.is_none() {
            return Err(LevelsError::Feed("paper venue has no reference".to_string()));
        }
        Ok(top)
    }
}

impl OrderBookSource for PaperVenue {
    /// `depth` levels per side, each a further `slippage` away.
    fn order_book(&self, depth: usize) -> ladder_core::Result<OrderBook> {
        let reference = self.reference().inner();
        let amount = Size::new(self.config.level_amount);
        let step = |i: usize| self.config.slippage * Decimal::from(i + 1);
        Ok(OrderBook {
            bids: (0..depth)
                .map(|i| Level::new(Price::new(reference * (Decimal::ONE - step(i))), amount))
                .collect(),
            asks: (0..depth)
                .map(|i| Level::new(Price::new(reference * (Decimal::ONE + step(i))), amount))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> PaperConfig {
        toml::from_str(
            r#"
base_balance = "100"
quote_balance = "50"
reference_price = "1.0"
maker_only = true
"#,
        )
        .unwrap()
    }

    fn venue() -> PaperVenue {
        PaperVenue::new(AssetPair::new("XLM", "USD"), config()).unwrap()
    }

    fn create(side: OrderSide, price: Decimal, amount: Decimal) -> Operation {
        Operation::Create {
            side,
            price: Price::new(price),
            amount: Size::new(amount),
        }
    }

    #[tokio::test]
    async fn test_creates_and_balances() {
        let venue = venue();
        venue
            .submit(vec![
                create(OrderSide::Sell, dec!(1.01), dec!(60)),
                create(OrderSide::Buy, dec!(0.99), dec!(20)),
            ])
            .await
            .unwrap();
        let offers = venue.load_offers().await.unwrap();
        assert_eq!(offers.len(), 2);

        let balances = venue.load_balances().await.unwrap();
        assert_eq!(balances.get("XLM").unwrap().available, dec!(100));
        assert_eq!(balances.get("USD").unwrap().available, dec!(50));
    }

    #[tokio::test]
    async fn test_rejects_whole_batch_on_error() {
        let venue = venue();
        let result = venue
            .submit(vec![
                create(OrderSide::Sell, dec!(1.01), dec!(60)),
                Operation::Delete {
                    offer_id: OfferId(42),
                    side: OrderSide::Sell,
                },
            ])
            .await;
        assert!(matches!(result, Err(TraderError::Rejected(_))));
        assert!(venue.open_offers().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_overcommitted_balance() {
        let venue = venue();
        let result = venue
            .submit(vec![
                create(OrderSide::Sell, dec!(1.01), dec!(60)),
                create(OrderSide::Sell, dec!(1.02), dec!(60)),
            ])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_maker_only_rejects_crossing() {
        let venue = venue();
        // best bid is 0.999
        let result = venue.submit(vec![create(OrderSide::Sell, dec!(0.999), dec!(1))]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_match_price_fills_crossed_orders() {
        let venue = venue();
        venue
            .submit(vec![
                create(OrderSide::Sell, dec!(1.01), dec!(10)),
                create(OrderSide::Sell, dec!(1.05), dec!(10)),
            ])
            .await
            .unwrap();

        let trades = venue.match_price(Price::new(dec!(1.02)), Utc::now());
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Price::new(dec!(1.01)));

        let balances = venue.load_balances().await.unwrap();
        assert_eq!(balances.get("XLM").unwrap().available, dec!(90));
        assert_eq!(balances.get("USD").unwrap().available, dec!(60.10));
        assert_eq!(venue.open_offers().len(), 1);
        assert_eq!(venue.trades_since(None).await.unwrap().len(), 1);
        assert!(venue.trades_since(Some(1)).await.unwrap().is_empty());
    }

    #[test]
    fn test_synthetic_book() {
        let venue = venue();
        let top = venue.ticker().unwrap();
        assert_eq!(top.best_bid, Some(Price::new(dec!(0.999))));
        assert_eq!(top.best_ask, Some(Price::new(dec!(1.001))));

        let book = venue.order_book(3).unwrap();
        assert_eq!(book.bids.len(), 3);
        assert_eq!(book.asks[2].price, Price::new(dec!(1.003)));
        assert_eq!(venue.top_of_book().unwrap(), top);
    }
}
