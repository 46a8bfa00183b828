//! Venue precision and minimum size.

use ladder_core::{Offer, Operation, OrderConstraints, Price, Size};
use tracing::trace;

use crate::error::FilterResult;
use crate::merge::{filter_ops, Verdict};
use crate::pipeline::SubmitFilter;

/// Quantizes prices and amounts and drops orders below the venue minimum.
///
/// Always runs last in a [`FilterPipeline`](crate::FilterPipeline).
#[derive(Debug, Clone)]
pub struct OrderConstraintsFilter {
    constraints: OrderConstraints,
}

impl OrderConstraintsFilter {
    pub fn new(constraints: OrderConstraints) -> Self {
        Self { constraints }
    }

    fn check(&self, op: &Operation) -> Verdict {
        let (Some(price), amount) = (op.price(), op.amount()) else {
            return Verdict::Keep(op.clone());
        };
        let price = self.constraints.price(price);
        let amount = self.constraints.volume(amount);
        if !price.is_positive() || !amount.is_positive() || amount < self.constraints.min_base_volume {
            trace!(%op, min = %self.constraints.min_base_volume, "below venue minimum");
            return Verdict::Drop;
        }
        Verdict::Keep(with_terms(op, price, amount))
    }
}

/// Same operation with a new price and amount.
pub(crate) fn with_terms(op: &Operation, price: Price, amount: Size) -> Operation {
    match op {
        Operation::Create { side, .. } => Operation::Create {
            side: *side,
            price,
            amount,
        },
        Operation::Modify { offer_id, side, .. } => Operation::Modify {
            offer_id: *offer_id,
            side: *side,
            price,
            amount,
        },
        Operation::Delete { .. } => op.clone(),
    }
}

impl SubmitFilter for OrderConstraintsFilter {
    fn name(&self) -> &'static str {
        "order_constraints"
    }

    fn apply(
        &self,
        ops: &[Operation],
        sell_offers: &[Offer],
        buy_offers: &[Offer],
    ) -> FilterResult<Vec<Operation>> {
        filter_ops(self.name(), ops, sell_offers, buy_offers, |op| Ok(self.check(op)))
    }
}
