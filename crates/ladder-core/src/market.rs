//! External market data consumed by strategies and filters.

use crate::error::Result;
use crate::{OrderBook, TopOfBook};

/// Order book of the pair being quoted, or of a market being mirrored.
pub trait OrderBookSource: Send + Sync {
    /// Up to `depth` levels per side, best first.
    fn order_book(&self, depth: usize) -> Result<OrderBook>;

    fn top_of_book(&self) -> Result<TopOfBook> {
        Ok(self.order_book(1)?.top())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Level, Price, Size};
    use rust_decimal_macros::dec;

    struct FixedBook(OrderBook);

    impl OrderBookSource for FixedBook {
        fn order_book(&self, depth: usize) -> Result<OrderBook> {
            Ok(OrderBook {
                bids: self.0.bids.iter().take(depth).copied().collect(),
                asks: self.0.asks.iter().take(depth).copied().collect(),
            })
        }
    }

    #[test]
    fn test_top_of_book_defaults_to_depth_one() {
        let book = FixedBook(OrderBook {
            bids: vec![
                Level::new(Price::new(dec!(0.99)), Size::new(dec!(5))),
                Level::new(Price::new(dec!(0.98)), Size::new(dec!(9))),
            ],
            asks: vec![Level::new(Price::new(dec!(1.01)), Size::new(dec!(3)))],
        });
        let top = book.top_of_book().unwrap();
        assert_eq!(top.best_bid, Some(Price::new(dec!(0.99))));
        assert_eq!(top.best_ask, Some(Price::new(dec!(1.01))));
        assert_eq!(book.order_book(1).unwrap().bids.len(), 1);
    }
}
