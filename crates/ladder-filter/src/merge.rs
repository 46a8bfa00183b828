//! Merge of proposed operations with live offers.
//!
//! Both inputs are sorted best first per side. Walking them together lets a
//! filter re-check resting offers that the strategy left untouched, in price
//! order, without disturbing the order the strategy chose for its own
//! operations. Deletes produced here are always placed at the front of the
//! output so they free balance before anything else runs.

use std::collections::HashSet;

use ladder_core::{Offer, OfferId, Operation, OrderSide};
use ladder_telemetry::Metrics;
use tracing::debug;

use crate::error::FilterResult;

/// Decision of a filter for one proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Submit this (possibly rewritten) operation.
    Keep(Operation),
    /// Remove the proposal; an existing offer behind it is deleted.
    Drop,
}

/// Cursor and outcome tallies for one input list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounter {
    pub idx: usize,
    pub kept: u64,
    pub dropped: u64,
    pub transformed: u64,
    pub ignored: u64,
}

impl FilterCounter {
    fn record(&self, filter: &str, subject: &str) {
        Metrics::filter_outcome(filter, subject, "kept", self.kept);
        Metrics::filter_outcome(filter, subject, "dropped", self.dropped);
        Metrics::filter_outcome(filter, subject, "transformed", self.transformed);
        Metrics::filter_outcome(filter, subject, "ignored", self.ignored);
    }
}

/// Offers that an incoming operation already modifies or deletes.
///
/// Only the operation's version is considered; the stale offer is skipped.
fn referenced_offer_ids(ops: &[Operation]) -> HashSet<OfferId> {
    ops.iter().filter_map(Operation::offer_id).collect()
}

/// The resting offer restated as an operation that leaves it unchanged.
fn offer_as_proposal(offer: &Offer) -> Operation {
    Operation::Modify {
        offer_id: offer.id,
        side: offer.side,
        price: offer.price,
        amount: offer.amount,
    }
}

/// Accumulates the filtered output for one `filter_ops` call.
struct Merger<'a, F> {
    name: &'a str,
    transform: F,
    out: Vec<Operation>,
    ops: FilterCounter,
    sell: FilterCounter,
    buy: FilterCounter,
}

impl<F> Merger<'_, F>
where
    F: FnMut(&Operation) -> FilterResult<Verdict>,
{
    fn counter(&mut self, side: OrderSide) -> &mut FilterCounter {
        match side {
            OrderSide::Sell => &mut self.sell,
            OrderSide::Buy => &mut self.buy,
        }
    }

    fn prepend(&mut self, op: Operation) {
        self.out.insert(0, op);
    }

    fn evaluate_offer(&mut self, offer: &Offer) -> FilterResult<()> {
        let proposal = offer_as_proposal(offer);
        match (self.transform)(&proposal)? {
            Verdict::Keep(op) if op == proposal => {
                self.counter(offer.side).kept += 1;
            }
            Verdict::Keep(op) => {
                self.out.push(op);
                self.counter(offer.side).transformed += 1;
            }
            Verdict::Drop => {
                self.prepend(offer.cancel());
                self.counter(offer.side).dropped += 1;
            }
        }
        Ok(())
    }

    fn evaluate_op(&mut self, op: &Operation) -> FilterResult<()> {
        // deletes are never dropped
        if op.is_delete() {
            self.out.push(op.clone());
            self.ops.kept += 1;
            return Ok(());
        }

        match (self.transform)(op)? {
            Verdict::Keep(new) => {
                if &new == op {
                    self.ops.kept += 1;
                } else {
                    self.ops.transformed += 1;
                }
                self.out.push(new);
            }
            Verdict::Drop => match op.offer_id() {
                Some(offer_id) => {
                    // a dropped modify turns into a delete of its offer
                    self.prepend(Operation::Delete {
                        offer_id,
                        side: op.side(),
                    });
                    self.ops.transformed += 1;
                }
                None => self.ops.dropped += 1,
            },
        }
        Ok(())
    }
}

/// Run `transform` over every operation and every live offer.
///
/// `sell_offers` must be sorted ascending by price and `buy_offers`
/// descending. Operations stay in their original relative order; each offer
/// is evaluated at the point where its price is reached on its side. Offers
/// kept unchanged produce no output.
///
/// Offers left over once the operations run out go through `transform`
/// like any other: the ones it keeps stay resting and only dropped ones
/// become prepended deletes.
pub fn filter_ops<F>(
    name: &str,
    ops: &[Operation],
    sell_offers: &[Offer],
    buy_offers: &[Offer],
    transform: F,
) -> FilterResult<Vec<Operation>>
where
    F: FnMut(&Operation) -> FilterResult<Verdict>,
{
    let ignored = referenced_offer_ids(ops);
    let mut merger = Merger {
        name,
        transform,
        out: Vec::with_capacity(ops.len()),
        ops: FilterCounter::default(),
        sell: FilterCounter::default(),
        buy: FilterCounter::default(),
    };

    while merger.ops.idx < ops.len() {
        let op = &ops[merger.ops.idx];
        let side = op.side();
        let offers = match side {
            OrderSide::Sell => sell_offers,
            OrderSide::Buy => buy_offers,
        };

        let offer = match (op.price(), offers.get(merger.counter(side).idx)) {
            (Some(op_price), Some(offer)) => {
                if ignored.contains(&offer.id) {
                    let counter = merger.counter(side);
                    counter.idx += 1;
                    counter.ignored += 1;
                    continue;
                }
                // on a tie the resting offer wins so it is not recreated
                if side.is_better(op_price, offer.price) {
                    None
                } else {
                    Some(offer)
                }
            }
            _ => None,
        };

        match offer {
            Some(offer) => {
                merger.counter(side).idx += 1;
                merger.evaluate_offer(offer)?;
            }
            None => {
                merger.ops.idx += 1;
                merger.evaluate_op(op)?;
            }
        }
    }

    for (side, offers) in [(OrderSide::Sell, sell_offers), (OrderSide::Buy, buy_offers)] {
        while merger.counter(side).idx < offers.len() {
            let offer = &offers[merger.counter(side).idx];
            merger.counter(side).idx += 1;
            if ignored.contains(&offer.id) {
                merger.counter(side).ignored += 1;
                continue;
            }
            merger.evaluate_offer(offer)?;
        }
    }

    let Merger {
        name,
        out,
        ops: op_counter,
        sell,
        buy,
        ..
    } = merger;
    debug!(
        filter = name,
        dropped = op_counter.dropped,
        transformed = op_counter.transformed,
        kept = op_counter.kept,
        total = ops.len(),
        "filter result for operations"
    );
    debug!(
        filter = name,
        dropped = sell.dropped,
        transformed = sell.transformed,
        kept = sell.kept,
        ignored = sell.ignored,
        total = sell_offers.len(),
        "filter result for sell offers"
    );
    debug!(
        filter = name,
        dropped = buy.dropped,
        transformed = buy.transformed,
        kept = buy.kept,
        ignored = buy.ignored,
        total = buy_offers.len(),
        "filter result for buy offers"
    );
    op_counter.record(name, "ops");
    sell.record(name, "sell_offers");
    buy.record(name, "buy_offers");
    Ok(out)
}
