//! Mirrors another market's order book onto ours.
//!
//! Bids are placed `per_level_spread` below and asks the same fraction above
//! the external levels, with volume divided by `volume_divide_by`.

use std::sync::Arc;

use ladder_core::{
    Level, LiveOrders, Offer, Operation, OrderBookSource, OrderConstraints, OrderSide, Price,
    Size, Snapshot,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StrategyError, StrategyResult};
use crate::strategy::Strategy;

/// Differences at or below this are not worth a modify.
const EPSILON: Decimal = dec!(0.0001);
/// Precision used when comparing old and new orders.
const COMPARE_DP: u32 = 6;

/// `[strategy.mirror]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Name of a registered order book source.
    pub source: String,
    #[serde(default = "default_orderbook_depth")]
    pub orderbook_depth: usize,
    #[serde(default = "default_volume_divide_by")]
    pub volume_divide_by: Decimal,
    #[serde(default)]
    pub per_level_spread: Decimal,
}

fn default_orderbook_depth() -> usize {
    20
}

fn default_volume_divide_by() -> Decimal {
    Decimal::ONE
}

pub struct MirrorStrategy {
    config: MirrorConfig,
    book: Arc<dyn OrderBookSource>,
    constraints: OrderConstraints,
}

impl MirrorStrategy {
    pub fn new(
        config: MirrorConfig,
        book: Arc<dyn OrderBookSource>,
        constraints: OrderConstraints,
    ) -> StrategyResult<Self> {
        if config.volume_divide_by <= Decimal::ZERO {
            return Err(StrategyError::InvalidConfig(format!(
                "volume_divide_by must be positive, got {}",
                config.volume_divide_by
            )));
        }
        if config.per_level_spread < Decimal::ZERO || config.per_level_spread >= Decimal::ONE {
            return Err(StrategyError::InvalidConfig(format!(
                "per_level_spread must be within [0, 1), got {}",
                config.per_level_spread
            )));
        }
        Ok(Self {
            config,
            book,
            constraints,
        })
    }

    fn target(&self, level: &Level, multiplier: Decimal) -> (Price, Size) {
        (
            self.constraints.price(Price::new(level.price.inner() * multiplier)),
            self.constraints
                .volume(Size::new(level.amount.inner() / self.config.volume_divide_by)),
        )
    }

    /// Align old offers with new levels from the worst end.
    fn update_levels(
        &self,
        side: OrderSide,
        old: &[Offer],
        new: &[Level],
        multiplier: Decimal,
    ) -> Vec<Operation> {
        let mut ops = Vec::new();
        if new.len() >= old.len() {
            let offset = new.len() - old.len();
            for i in (offset..new.len()).rev() {
                ops.extend(self.modify(&old[i - offset], &new[i], multiplier));
            }
            for level in new[..offset].iter().rev() {
                let (price, amount) = self.target(level, multiplier);
                if amount.is_zero() {
                    continue;
                }
                ops.push(Operation::Create {
                    side,
                    price,
                    amount,
                });
            }
        } else {
            let offset = old.len() - new.len();
            for i in (offset..old.len()).rev() {
                ops.extend(self.modify(&old[i], &new[i - offset], multiplier));
            }
            ops.extend(old[..offset].iter().rev().map(Offer::cancel));
        }
        ops
    }

    fn modify(&self, old: &Offer, level: &Level, multiplier: Decimal) -> Option<Operation> {
        let (price, amount) = self.target(level, multiplier);
        let same_price = (old.price.inner().round_dp(COMPARE_DP)
            - price.inner().round_dp(COMPARE_DP))
        .abs()
            <= EPSILON;
        let same_amount = (old.amount.inner().round_dp(COMPARE_DP)
            - amount.inner().round_dp(COMPARE_DP))
        .abs()
            <= EPSILON;
        if same_price && same_amount {
            return None;
        }
        if amount.is_zero() {
            return Some(old.cancel());
        }
        Some(Operation::Modify {
            offer_id: old.id,
            side: old.side,
            price,
            amount,
        })
    }
}

impl Strategy for MirrorStrategy {
    fn max_history(&self) -> usize {
        0
    }

    fn pre_update(&mut self, _snapshot: &Snapshot) -> StrategyResult<()> {
        Ok(())
    }

    fn prune_existing_offers(&mut self, snapshot: &Snapshot) -> (Vec<Operation>, LiveOrders) {
        (Vec::new(), snapshot.live.clone())
    }

    fn update_with_ops(
        &mut self,
        _history: &[Snapshot],
        _snapshot: &Snapshot,
        live: &LiveOrders,
    ) -> StrategyResult<Vec<Operation>> {
        let book = self.book.order_book(self.config.orderbook_depth)?;
        let spread = self.config.per_level_spread;

        let buy_ops = self.update_levels(OrderSide::Buy, &live.buy, &book.bids, Decimal::ONE - spread);
        let sell_ops =
            self.update_levels(OrderSide::Sell, &live.sell, &book.asks, Decimal::ONE + spread);
        info!(
            buy_ops = buy_ops.len(),
            sell_ops = sell_ops.len(),
            source = %self.config.source,
            "mirror update"
        );

        let mirrored_bid = book.bids.first().map(|l| self.target(l, Decimal::ONE - spread).0);
        let crossing = match (mirrored_bid, live.best_sell()) {
            (Some(bid), Some(ask)) => bid >= ask.price,
            _ => false,
        };

        let mut ops = Vec::with_capacity(buy_ops.len() + sell_ops.len());
        if crossing {
            debug!("mirrored bid crosses our best ask, submitting sell side first");
            ops.extend(sell_ops);
            ops.extend(buy_ops);
        } else {
            ops.extend(buy_ops);
            ops.extend(sell_ops);
        }
        Ok(ops)
    }
}
