//! Keeps every order on the passive side of the book.

use std::sync::Arc;

use ladder_core::{Offer, Operation, OrderBookSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FilterResult;
use crate::merge::{filter_ops, Verdict};
use crate::pipeline::SubmitFilter;

/// `[filters.maker_mode]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerModeConfig {
    /// Name of a registered order book source for our own market.
    pub source: String,
}

/// Drops proposals that would trade immediately against the top of book.
pub struct MakerModeFilter {
    book: Arc<dyn OrderBookSource>,
}

impl MakerModeFilter {
    pub fn new(book: Arc<dyn OrderBookSource>) -> Self {
        Self { book }
    }
}

impl SubmitFilter for MakerModeFilter {
    fn name(&self) -> &'static str {
        "maker_mode"
    }

    fn apply(
        &self,
        ops: &[Operation],
        sell_offers: &[Offer],
        buy_offers: &[Offer],
    ) -> FilterResult<Vec<Operation>> {
        let top = self.book.top_of_book()?;
        debug!(best_bid = ?top.best_bid, best_ask = ?top.best_ask, "maker mode top of book");
        filter_ops(self.name(), ops, sell_offers, buy_offers, |op| {
            Ok(match op.price() {
                Some(price) if top.crosses(op.side(), price) => Verdict::Drop,
                _ => Verdict::Keep(op.clone()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_core::{CoreError, Level, OrderBook, OrderSide, Price, Size};
    use rust_decimal_macros::dec;

    struct Top;

    impl OrderBookSource for Top {
        fn order_book(&self, _depth: usize) -> ladder_core::Result<OrderBook> {
            Ok(OrderBook {
                bids: vec![Level::new(Price::new(dec!(0.99)), Size::new(dec!(10)))],
                asks: vec![Level::new(Price::new(dec!(1.01)), Size::new(dec!(10)))],
            })
        }
    }

    struct Down;

    impl OrderBookSource for Down {
        fn order_book(&self, _depth: usize) -> ladder_core::Result<OrderBook> {
            Err(CoreError::Unavailable("book".to_string()))
        }
    }

    fn create(side: OrderSide, price: rust_decimal::Decimal) -> Operation {
        Operation::Create {
            side,
            price: Price::new(price),
            amount: Size::new(dec!(1)),
        }
    }

    #[test]
    fn test_drops_crossing_creates() {
        let filter = MakerModeFilter::new(Arc::new(Top));
        let ops = vec![
            create(OrderSide::Sell, dec!(0.99)),
            create(OrderSide::Sell, dec!(1.02)),
            create(OrderSide::Buy, dec!(1.01)),
            create(OrderSide::Buy, dec!(0.98)),
        ];
        let out = filter.apply(&ops, &[], &[]).unwrap();
        assert_eq!(out, vec![ops[1].clone(), ops[3].clone()]);
    }

    #[test]
    fn test_deletes_resting_offer_that_now_crosses() {
        let filter = MakerModeFilter::new(Arc::new(Top));
        let sells = vec![Offer::new(5, OrderSide::Sell, Price::new(dec!(0.98)), Size::new(dec!(1)))];
        let out = filter.apply(&[], &sells, &[]).unwrap();
        assert_eq!(out, vec![sells[0].cancel()]);
    }

    #[test]
    fn test_book_failure_is_an_error() {
        let filter = MakerModeFilter::new(Arc::new(Down));
        assert!(filter.apply(&[], &[], &[]).is_err());
    }
}
