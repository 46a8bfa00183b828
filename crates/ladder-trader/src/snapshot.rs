//! Per-tick snapshot loading.
//!
//! Each piece of account data is a [`DataKey`]. Keys may depend on others
//! and are fetched in dependency order so a dependent read never observes
//! older venue state than the data it depends on.

use std::collections::{BTreeMap, BTreeSet};

use ladder_core::{Balances, Clock, LiveOrders, Offer, Snapshot};
use tracing::debug;

use crate::error::{TraderError, TraderResult};
use crate::venue::Venue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataKey {
    Offers,
    Balances,
}

impl DataKey {
    pub const ALL: [DataKey; 2] = [DataKey::Offers, DataKey::Balances];

    /// Keys that must be loaded before this one.
    #[must_use]
    pub fn dependencies(&self) -> &'static [DataKey] {
        match self {
            Self::Offers => &[],
            Self::Balances => &[Self::Offers],
        }
    }
}

/// Topological order of `nodes` where `deps(n)` must precede `n`.
///
/// Ties resolve in `Ord` order so the result is deterministic. Returns
/// `None` when the graph has a cycle or a dependency outside `nodes`.
pub fn dependency_order<K, F>(nodes: &[K], deps: F) -> Option<Vec<K>>
where
    K: Copy + Ord,
    F: Fn(&K) -> Vec<K>,
{
    let mut remaining: BTreeMap<K, BTreeSet<K>> = BTreeMap::new();
    for node in nodes {
        remaining.insert(*node, deps(node).into_iter().collect());
    }
    if remaining
        .values()
        .flatten()
        .any(|dep| !remaining.contains_key(dep))
    {
        return None;
    }

    let mut order = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        let ready = remaining
            .iter()
            .find(|(_, deps)| deps.is_empty())
            .map(|(node, _)| *node)?;
        remaining.remove(&ready);
        for deps in remaining.values_mut() {
            deps.remove(&ready);
        }
        order.push(ready);
    }
    Some(order)
}

/// Load balances and live orders from the venue.
pub async fn load_snapshot(venue: &dyn Venue, clock: &dyn Clock) -> TraderResult<Snapshot> {
    let order = dependency_order(&DataKey::ALL, |k| k.dependencies().to_vec())
        .ok_or_else(|| TraderError::Snapshot("cyclic data dependencies".to_string()))?;

    let mut offers: Option<Vec<Offer>> = None;
    let mut balances: Option<Balances> = None;
    for key in order {
        debug!(?key, "loading snapshot data");
        match key {
            DataKey::Offers => offers = Some(venue.load_offers().await?),
            DataKey::Balances => balances = Some(venue.load_balances().await?),
        }
    }

    let (Some(offers), Some(balances)) = (offers, balances) else {
        return Err(TraderError::Snapshot("snapshot data not loaded".to_string()));
    };
    let live = LiveOrders::from_offers(offers);
    debug!(sell = live.sell.len(), buy = live.buy.len(), "loaded live orders");
    Ok(Snapshot::new(balances, live, clock.now()))
}
