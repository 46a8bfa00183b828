//! Venue abstraction for order submission and account queries.
//!
//! Methods return boxed futures so the trait stays object safe and a
//! `Trader` can hold an `Arc<dyn Venue>`.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use ladder_core::{Balances, Offer, Operation, Trade};
use parking_lot::Mutex;

use crate::error::{TraderError, TraderResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Account access on one trading venue.
pub trait Venue: Send + Sync {
    /// Current balances of every asset the account holds.
    fn load_balances(&self) -> BoxFuture<'_, TraderResult<Balances>>;

    /// All of the account's resting orders on the traded pair.
    fn load_offers(&self) -> BoxFuture<'_, TraderResult<Vec<Offer>>>;

    /// Execute `ops` in list order.
    ///
    /// A venue may reject a whole batch or stop part way through; callers
    /// must not assume either.
    fn submit(&self, ops: Vec<Operation>) -> BoxFuture<'_, TraderResult<()>>;

    /// Fills with a sequence number above `cursor`, oldest first.
    fn trades_since(&self, cursor: Option<u64>) -> BoxFuture<'_, TraderResult<Vec<Trade>>>;

    /// Drop data cached for the current tick. Called between the prune and
    /// update phases.
    fn reset_tick_cache(&self) {}
}

/// Arc wrapper for Venue trait objects.
pub type DynVenue = Arc<dyn Venue>;

/// Scripted venue for testing.
#[derive(Debug, Default)]
pub struct MockVenue {
    balances: Mutex<Balances>,
    offers: Mutex<Vec<Offer>>,
    trades: Mutex<Vec<Trade>>,
    /// Every successful or failed submit, in call order.
    submits: Mutex<Vec<Vec<Operation>>>,
    fail_loads: AtomicBool,
    /// Number of upcoming submits to reject.
    failing_submits: AtomicUsize,
    cache_resets: AtomicUsize,
}

impl MockVenue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balances(&self, balances: Balances) {
        *self.balances.lock() = balances;
    }

    pub fn set_offers(&self, offers: Vec<Offer>) {
        *self.offers.lock() = offers;
    }

    /// Offers still resting after the deletes submitted so far.
    pub fn offers(&self) -> Vec<Offer> {
        self.offers.lock().clone()
    }

    pub fn push_trade(&self, trade: Trade) {
        self.trades.lock().push(trade);
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Reject the next `count` submits.
    pub fn fail_next_submits(&self, count: usize) {
        self.failing_submits.store(count, Ordering::SeqCst);
    }

    /// Recorded submits.
    pub fn get_submits(&self) -> Vec<Vec<Operation>> {
        self.submits.lock().clone()
    }

    pub fn clear_submits(&self) {
        self.submits.lock().clear();
    }

    pub fn cache_resets(&self) -> usize {
        self.cache_resets.load(Ordering::SeqCst)
    }

    fn check_loads(&self) -> TraderResult<()> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(TraderError::Venue("mock load failure".to_string()));
        }
        Ok(())
    }
}

impl Venue for MockVenue {
    fn load_balances(&self) -> BoxFuture<'_, TraderResult<Balances>> {
        Box::pin(async move {
            self.check_loads()?;
            Ok(self.balances.lock().clone())
        })
    }

    fn load_offers(&self) -> BoxFuture<'_, TraderResult<Vec<Offer>>> {
        Box::pin(async move {
            self.check_loads()?;
            Ok(self.offers.lock().clone())
        })
    }

    fn submit(&self, ops: Vec<Operation>) -> BoxFuture<'_, TraderResult<()>> {
        Box::pin(async move {
            self.submits.lock().push(ops.clone());
            let failing = self.failing_submits.load(Ordering::SeqCst);
            if failing > 0 {
                self.failing_submits.store(failing - 1, Ordering::SeqCst);
                return Err(TraderError::Rejected("mock submit failure".to_string()));
            }
            let mut offers = self.offers.lock();
            for op in &ops {
                if let Operation::Delete { offer_id, .. } = op {
                    offers.retain(|o| o.id != *offer_id);
                }
            }
            Ok(())
        })
    }

    fn trades_since(&self, cursor: Option<u64>) -> BoxFuture<'_, TraderResult<Vec<Trade>>> {
        Box::pin(async move {
            Ok(self
                .trades
                .lock()
                .iter()
                .filter(|t| cursor.map_or(true, |c| t.seq > c))
                .cloned()
                .collect())
        })
    }

    fn reset_tick_cache(&self) {
        self.cache_resets.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ladder_core::{OfferId, OrderSide, Price, Size};
    use rust_decimal_macros::dec;

    fn trade(seq: u64) -> Trade {
        Trade {
            seq,
            side: OrderSide::Sell,
            price: Price::new(dec!(1)),
            amount: Size::new(dec!(2)),
            executed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_mock_venue_records_submits() {
        let venue = MockVenue::new();
        let ops = vec![Operation::Delete {
            offer_id: OfferId(1),
            side: OrderSide::Sell,
        }];
        venue.set_offers(vec![Offer::new(1, OrderSide::Sell, Price::new(dec!(1)), Size::new(dec!(2)))]);
        venue.submit(ops.clone()).await.unwrap();
        assert_eq!(venue.get_submits(), vec![ops]);
        assert!(venue.offers().is_empty());
    }

    #[tokio::test]
    async fn test_mock_venue_scripted_failures() {
        let venue = MockVenue::new();
        venue.fail_next_submits(1);
        assert!(venue.submit(vec![]).await.is_err());
        assert!(venue.submit(vec![]).await.is_ok());

        venue.set_fail_loads(true);
        assert!(venue.load_offers().await.is_err());
        assert!(venue.load_balances().await.is_err());
    }

    #[tokio::test]
    async fn test_trades_since_cursor() {
        let venue = MockVenue::new();
        venue.push_trade(trade(1));
        venue.push_trade(trade(2));
        assert_eq!(venue.trades_since(None).await.unwrap().len(), 2);
        let after = venue.trades_since(Some(1)).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].seq, 2);
    }
}
