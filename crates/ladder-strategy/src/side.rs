//! One side of a two-sided strategy.

use ladder_core::{Balances, Offer, Operation, OrderSide, Price};

use crate::delete_side::DeleteSideStrategy;
use crate::error::StrategyResult;
use crate::sell_side::SellSideStrategy;

/// Operations emitted by a side plus the best frame price among them.
pub type SideUpdate = (Vec<Operation>, Option<Price>);

/// Diffs one side's desired ladder against its live orders.
///
/// Every side reasons as a seller: the buy side sells the quote asset, so its
/// prices are reciprocal and its amounts are in quote units until converted
/// back when an operation is built.
pub trait SideStrategy: Send {
    fn side(&self) -> OrderSide;

    fn max_history(&self) -> usize {
        0
    }

    fn pre_update(&mut self, balances: &Balances) -> StrategyResult<()>;

    /// Delete orders beyond the ladder; returns the orders still in play.
    fn prune_existing_offers(&mut self, offers: &[Offer]) -> (Vec<Operation>, Vec<Offer>);

    /// `offers` are this side's remaining orders, best first.
    fn update_with_ops(&mut self, offers: &[Offer]) -> StrategyResult<SideUpdate>;

    fn post_update(&mut self) -> StrategyResult<()> {
        Ok(())
    }
}

pub enum SideStrategyKind {
    Sell(SellSideStrategy),
    Delete(DeleteSideStrategy),
}

impl SideStrategyKind {
    fn inner(&self) -> &dyn SideStrategy {
        match self {
            Self::Sell(s) => s,
            Self::Delete(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SideStrategy {
        match self {
            Self::Sell(s) => s,
            Self::Delete(s) => s,
        }
    }
}

impl SideStrategy for SideStrategyKind {
    fn side(&self) -> OrderSide {
        self.inner().side()
    }

    fn max_history(&self) -> usize {
        self.inner().max_history()
    }

    fn pre_update(&mut self, balances: &Balances) -> StrategyResult<()> {
        self.inner_mut().pre_update(balances)
    }

    fn prune_existing_offers(&mut self, offers: &[Offer]) -> (Vec<Operation>, Vec<Offer>) {
        self.inner_mut().prune_existing_offers(offers)
    }

    fn update_with_ops(&mut self, offers: &[Offer]) -> StrategyResult<SideUpdate> {
        self.inner_mut().update_with_ops(offers)
    }

    fn post_update(&mut self) -> StrategyResult<()> {
        self.inner_mut().post_update()
    }
}

impl From<SellSideStrategy> for SideStrategyKind {
    fn from(s: SellSideStrategy) -> Self {
        Self::Sell(s)
    }
}

impl From<DeleteSideStrategy> for SideStrategyKind {
    fn from(s: DeleteSideStrategy) -> Self {
        Self::Delete(s)
    }
}
