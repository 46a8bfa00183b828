//! Side that keeps nothing on the book.

use ladder_core::{Balances, Offer, Operation, OrderSide};
use tracing::info;

use crate::error::StrategyResult;
use crate::side::{SideStrategy, SideUpdate};

/// Deletes every live order on its side and never creates any.
#[derive(Debug, Clone, Copy)]
pub struct DeleteSideStrategy {
    side: OrderSide,
}

impl DeleteSideStrategy {
    pub fn new(side: OrderSide) -> Self {
        Self { side }
    }
}

impl SideStrategy for DeleteSideStrategy {
    fn side(&self) -> OrderSide {
        self.side
    }

    fn pre_update(&mut self, _balances: &Balances) -> StrategyResult<()> {
        Ok(())
    }

    fn prune_existing_offers(&mut self, offers: &[Offer]) -> (Vec<Operation>, Vec<Offer>) {
        if !offers.is_empty() {
            info!(side = %self.side, count = offers.len(), "deleting all offers");
        }
        (offers.iter().map(Offer::cancel).collect(), Vec::new())
    }

    fn update_with_ops(&mut self, _offers: &[Offer]) -> StrategyResult<SideUpdate> {
        Ok((Vec::new(), None))
    }
}
