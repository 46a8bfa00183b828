//! The per-pair strategy capability driven by the control loop.

use ladder_core::{LiveOrders, Operation, Snapshot};

use crate::compose::ComposeStrategy;
use crate::error::StrategyResult;
use crate::mirror::MirrorStrategy;

/// One tick runs `pre_update`, `prune_existing_offers`, `update_with_ops`
/// and `post_update` in that order against the same snapshot.
pub trait Strategy: Send {
    /// Past snapshots the strategy wants to see.
    fn max_history(&self) -> usize;

    fn pre_update(&mut self, snapshot: &Snapshot) -> StrategyResult<()>;

    /// Deletes for orders the new ladder has no room for, and the orders
    /// that remain for `update_with_ops`.
    fn prune_existing_offers(&mut self, snapshot: &Snapshot) -> (Vec<Operation>, LiveOrders);

    fn update_with_ops(
        &mut self,
        history: &[Snapshot],
        snapshot: &Snapshot,
        live: &LiveOrders,
    ) -> StrategyResult<Vec<Operation>>;

    fn post_update(&mut self, _history: &[Snapshot], _snapshot: &Snapshot) -> StrategyResult<()> {
        Ok(())
    }
}

/// Every strategy the factory can build.
pub enum StrategyKind {
    Compose(ComposeStrategy),
    Mirror(MirrorStrategy),
}

impl StrategyKind {
    fn inner_mut(&mut self) -> &mut dyn Strategy {
        match self {
            Self::Compose(s) => s,
            Self::Mirror(s) => s,
        }
    }
}

impl Strategy for StrategyKind {
    fn max_history(&self) -> usize {
        match self {
            Self::Compose(s) => s.max_history(),
            Self::Mirror(s) => s.max_history(),
        }
    }

    fn pre_update(&mut self, snapshot: &Snapshot) -> StrategyResult<()> {
        self.inner_mut().pre_update(snapshot)
    }

    fn prune_existing_offers(&mut self, snapshot: &Snapshot) -> (Vec<Operation>, LiveOrders) {
        self.inner_mut().prune_existing_offers(snapshot)
    }

    fn update_with_ops(
        &mut self,
        history: &[Snapshot],
        snapshot: &Snapshot,
        live: &LiveOrders,
    ) -> StrategyResult<Vec<Operation>> {
        self.inner_mut().update_with_ops(history, snapshot, live)
    }

    fn post_update(&mut self, history: &[Snapshot], snapshot: &Snapshot) -> StrategyResult<()> {
        self.inner_mut().post_update(history, snapshot)
    }
}

impl From<ComposeStrategy> for StrategyKind {
    fn from(s: ComposeStrategy) -> Self {
        Self::Compose(s)
    }
}

impl From<MirrorStrategy> for StrategyKind {
    fn from(s: MirrorStrategy) -> Self {
        Self::Mirror(s)
    }
}
