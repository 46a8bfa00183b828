//! Ladder-following side strategy.
//!
//! Computes the ladder once per tick in `pre_update`, then walks it from the
//! worst level to the best, creating missing orders and modifying those that
//! drifted outside the tolerance bands.

use ladder_core::{
    AssetPair, Balances, Level, Offer, Operation, OrderConstraints, OrderSide, Price, Size,
};
use ladder_levels::{LevelProvider, LevelProviderKind};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{StrategyError, StrategyResult};
use crate::side::{SideStrategy, SideUpdate};

pub struct SellSideStrategy {
    side: OrderSide,
    /// Pair from this side's seller point of view.
    assets: AssetPair,
    provider: LevelProviderKind,
    constraints: OrderConstraints,
    price_tolerance: Decimal,
    amount_tolerance: Decimal,

    current_levels: Vec<Level>,
    max_base: Decimal,
    max_quote: Decimal,
}

impl SellSideStrategy {
    /// `pair` is the traded pair in venue terms; the buy side swaps it.
    pub fn new(
        side: OrderSide,
        pair: &AssetPair,
        provider: LevelProviderKind,
        constraints: OrderConstraints,
        price_tolerance: Decimal,
        amount_tolerance: Decimal,
    ) -> Self {
        Self {
            side,
            assets: pair.for_side(side),
            provider,
            constraints,
            price_tolerance,
            amount_tolerance,
            current_levels: Vec::new(),
            max_base: Decimal::ZERO,
            max_quote: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn current_levels(&self) -> &[Level] {
        &self.current_levels
    }

    #[must_use]
    pub fn provider(&self) -> &LevelProviderKind {
        &self.provider
    }

    /// Amount to rest at `level`, in frame base units.
    fn target_amount(&self, index: usize, level: &Level) -> StrategyResult<Size> {
        let mut amount = level.amount.inner();
        if self.side == OrderSide::Buy {
            if !level.price.is_positive() {
                return Err(StrategyError::InvalidLevel {
                    index,
                    reason: format!("non-positive price {}", level.price),
                });
            }
            amount /= level.price.inner();
        }
        Ok(Size::new(amount.min(self.max_base)))
    }

    /// Operation in venue terms for a frame price and amount.
    fn pair_terms(&self, index: usize, price: Price, amount: Size) -> StrategyResult<(Price, Size)> {
        self.constraints
            .to_pair_terms(self.side, price, amount)
            .ok_or_else(|| StrategyError::InvalidLevel {
                index,
                reason: format!("cannot convert frame price {price} to pair terms"),
            })
    }

    fn update_level(&self, offers: &[Offer], index: usize) -> StrategyResult<Option<Operation>> {
        let level = self.current_levels[index];
        let target_price = level.price;
        let target_amount = self.target_amount(index, &level)?;

        let Some(offer) = offers.get(index) else {
            let (price, amount) = self.pair_terms(index, target_price, target_amount)?;
            if amount.is_zero() {
                debug!(side = %self.side, index, "zero target amount, skipping create");
                return Ok(None);
            }
            debug!(side = %self.side, action = "create", %price, %amount, "missing level");
            return Ok(Some(Operation::Create {
                side: self.side,
                price,
                amount,
            }));
        };

        let current_amount = offer.frame_amount();
        let price_ok = offer
            .frame_price()
            .is_some_and(|p| target_price.within_band(p, self.price_tolerance));
        let amount_ok = target_amount.within_band(current_amount, self.amount_tolerance);
        if price_ok && amount_ok {
            return Ok(None);
        }

        let (price, amount) = self.pair_terms(index, target_price, target_amount)?;
        debug!(
            side = %self.side,
            action = "modify",
            offer_id = %offer.id,
            target_price = %price,
            target_amount = %amount,
            current_price = %offer.price,
            current_amount = %offer.amount,
            price_ok,
            amount_ok,
            "offer outside tolerance"
        );
        if amount.is_zero() {
            return Ok(Some(offer.cancel()));
        }
        Ok(Some(Operation::Modify {
            offer_id: offer.id,
            side: self.side,
            price,
            amount,
        }))
    }
}

impl SideStrategy for SellSideStrategy {
    fn side(&self) -> OrderSide {
        self.side
    }

    fn pre_update(&mut self, balances: &Balances) -> StrategyResult<()> {
        let base = balances.get(&self.assets.base)?;
        let quote = balances.get(&self.assets.quote)?;
        self.max_base = base.available;
        self.max_quote = quote.available;

        let nothing_to_sell = self.max_base.is_zero();
        let line_full = quote.line_full();
        if nothing_to_sell || line_full {
            self.current_levels.clear();
            info!(
                side = %self.side,
                nothing_to_sell,
                line_full,
                "no capacity to place orders"
            );
            return Ok(());
        }

        match self.provider.get_levels(self.max_base, self.max_quote) {
            Ok(levels) => {
                debug!(side = %self.side, provider = self.provider.name(), levels = levels.len(), "levels loaded");
                self.current_levels = levels;
                Ok(())
            }
            Err(e) => {
                warn!(side = %self.side, error = %e, "levels couldn't be loaded");
                Err(e.into())
            }
        }
    }

    fn prune_existing_offers(&mut self, offers: &[Offer]) -> (Vec<Operation>, Vec<Offer>) {
        let keep = self.current_levels.len().min(offers.len());
        let prune: Vec<Operation> = offers[keep..].iter().map(Offer::cancel).collect();
        if !prune.is_empty() {
            debug!(side = %self.side, count = prune.len(), "pruning offers beyond ladder");
        }
        (prune, offers[..keep].to_vec())
    }

    fn update_with_ops(&mut self, offers: &[Offer]) -> StrategyResult<SideUpdate> {
        let mut ops = Vec::new();
        let mut new_top: Option<Price> = None;
        for index in (0..self.current_levels.len()).rev() {
            let Some(op) = self.update_level(offers, index)? else {
                continue;
            };
            if !op.is_delete() {
                let frame_price = self.current_levels[index].price;
                if new_top.map_or(true, |top| frame_price < top) {
                    new_top = Some(frame_price);
                }
            }
            ops.push(op);
        }
        Ok((ops, new_top))
    }
}
