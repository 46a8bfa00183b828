//! Two side strategies combined into one.

use ladder_core::{LiveOrders, Operation, Snapshot};
use tracing::debug;

use crate::error::{StrategyError, StrategyResult};
use crate::side::{SideStrategy, SideStrategyKind};
use crate::strategy::Strategy;

pub struct ComposeStrategy {
    buy: SideStrategyKind,
    sell: SideStrategyKind,
}

impl ComposeStrategy {
    pub fn new(buy: SideStrategyKind, sell: SideStrategyKind) -> Self {
        Self { buy, sell }
    }

    #[must_use]
    pub fn buy_side(&self) -> &SideStrategyKind {
        &self.buy
    }

    #[must_use]
    pub fn sell_side(&self) -> &SideStrategyKind {
        &self.sell
    }
}

impl Strategy for ComposeStrategy {
    fn max_history(&self) -> usize {
        self.buy.max_history().max(self.sell.max_history())
    }

    fn pre_update(&mut self, snapshot: &Snapshot) -> StrategyResult<()> {
        let buy = self.buy.pre_update(&snapshot.balances);
        let sell = self.sell.pre_update(&snapshot.balances);
        StrategyError::combine(buy, sell).map(|_| ())
    }

    fn prune_existing_offers(&mut self, snapshot: &Snapshot) -> (Vec<Operation>, LiveOrders) {
        let (mut ops, buy) = self.buy.prune_existing_offers(&snapshot.live.buy);
        let (sell_ops, sell) = self.sell.prune_existing_offers(&snapshot.live.sell);
        ops.extend(sell_ops);
        (ops, LiveOrders { sell, buy })
    }

    fn update_with_ops(
        &mut self,
        _history: &[Snapshot],
        snapshot: &Snapshot,
        live: &LiveOrders,
    ) -> StrategyResult<Vec<Operation>> {
        let buy = self.buy.update_with_ops(&live.buy);
        let sell = self.sell.update_with_ops(&live.sell);
        let ((buy_ops, top_buy_frame), (sell_ops, _)) = StrategyError::combine(buy, sell)?;

        let new_top_buy = top_buy_frame.and_then(|p| p.invert());
        let crossing = match (new_top_buy, snapshot.live.best_sell()) {
            (Some(bid), Some(ask)) => bid >= ask.price,
            _ => false,
        };

        let mut ops = Vec::with_capacity(buy_ops.len() + sell_ops.len());
        if crossing {
            debug!("new top bid would cross the book, submitting sell side first");
            ops.extend(sell_ops);
            ops.extend(buy_ops);
        } else {
            ops.extend(buy_ops);
            ops.extend(sell_ops);
        }
        Ok(ops)
    }

    fn post_update(&mut self, _history: &[Snapshot], _snapshot: &Snapshot) -> StrategyResult<()> {
        let buy = self.buy.post_update();
        let sell = self.sell.post_update();
        StrategyError::combine(buy, sell).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delete_side::DeleteSideStrategy;
    use crate::sell_side::SellSideStrategy;
    use chrono::Utc;
    use ladder_core::{
        AssetBalance, AssetPair, Balances, Offer, OrderConstraints, OrderSide, Price, Size,
    };
    use ladder_levels::{FeedPair, FixedFeed, StaticLevel, StaticSpreadLevelProvider};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn pair() -> AssetPair {
        AssetPair::new("XLM", "USD")
    }

    fn side(side: OrderSide, center: Decimal, spread: Decimal) -> SideStrategyKind {
        let feed = FeedPair::new(
            Arc::new(FixedFeed(Price::new(center))),
            Arc::new(FixedFeed(Price::ONE)),
        );
        let provider = StaticSpreadLevelProvider::new(
            side,
            vec![StaticLevel {
                spread,
                amount: dec!(10),
            }],
            Decimal::ONE,
            feed,
            OrderConstraints::default(),
        )
        .unwrap();
        SellSideStrategy::new(
            side,
            &pair(),
            provider.into(),
            OrderConstraints::default(),
            dec!(0.001),
            dec!(0.001),
        )
        .into()
    }

    fn snapshot(live: LiveOrders) -> Snapshot {
        let mut balances = Balances::new();
        balances.insert("XLM", AssetBalance::unlimited(dec!(1000)));
        balances.insert("USD", AssetBalance::unlimited(dec!(1000)));
        Snapshot::new(balances, live, Utc::now())
    }

    fn run(strategy: &mut ComposeStrategy, snap: &Snapshot) -> Vec<Operation> {
        strategy.pre_update(snap).unwrap();
        let (_, live) = strategy.prune_existing_offers(snap);
        strategy.update_with_ops(&[], snap, &live).unwrap()
    }

    #[test]
    fn test_buy_ops_first_when_not_crossing() {
        // bid at 1/0.5 = 2 below the resting ask at 3
        let mut s = ComposeStrategy::new(
            side(OrderSide::Buy, dec!(0.5), dec!(0)),
            side(OrderSide::Sell, dec!(3), dec!(0)),
        );
        let live = LiveOrders::new(
            vec![Offer::new(1, OrderSide::Sell, Price::new(dec!(3)), Size::new(dec!(99)))],
            vec![],
        );
        let ops = run(&mut s, &snapshot(live));
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].side(), OrderSide::Buy);
        assert_eq!(ops[1].side(), OrderSide::Sell);
    }

    #[test]
    fn test_sell_ops_first_when_crossing() {
        // new bid at 2 would cross the stale ask at 1.5
        let mut s = ComposeStrategy::new(
            side(OrderSide::Buy, dec!(0.5), dec!(0)),
            side(OrderSide::Sell, dec!(3), dec!(0)),
        );
        let live = LiveOrders::new(
            vec![Offer::new(1, OrderSide::Sell, Price::new(dec!(1.5)), Size::new(dec!(10)))],
            vec![],
        );
        let ops = run(&mut s, &snapshot(live));
        assert_eq!(ops[0].side(), OrderSide::Sell);
        assert_eq!(ops[1].side(), OrderSide::Buy);
    }

    #[test]
    fn test_prune_orders_buy_then_sell() {
        let mut s = ComposeStrategy::new(
            DeleteSideStrategy::new(OrderSide::Buy).into(),
            DeleteSideStrategy::new(OrderSide::Sell).into(),
        );
        let live = LiveOrders::new(
            vec![Offer::new(1, OrderSide::Sell, Price::new(dec!(2)), Size::new(dec!(1)))],
            vec![Offer::new(2, OrderSide::Buy, Price::new(dec!(1)), Size::new(dec!(1)))],
        );
        let snap = snapshot(live);
        s.pre_update(&snap).unwrap();
        let (ops, remaining) = s.prune_existing_offers(&snap);
        assert_eq!(ops[0].side(), OrderSide::Buy);
        assert_eq!(ops[1].side(), OrderSide::Sell);
        assert!(remaining.is_empty());
        assert_eq!(s.max_history(), 0);
    }

    #[test]
    fn test_error_annotation() {
        let mut s = ComposeStrategy::new(
            side(OrderSide::Buy, dec!(0.5), dec!(0)),
            side(OrderSide::Sell, dec!(3), dec!(0)),
        );
        let mut balances = Balances::new();
        balances.insert("XLM", AssetBalance::unlimited(dec!(1)));
        let snap = Snapshot::new(balances, LiveOrders::default(), Utc::now());
        let err = s.pre_update(&snap).unwrap_err();
        assert!(matches!(err, StrategyError::BothSides { .. }));
        assert!(err.to_string().starts_with("errors on both sides: buying (="));
    }
}
