//! The update loop.
//!
//! One tick: load a snapshot, let the strategy prune and then update its
//! orders, pass the update through the submit filters, submit, and record
//! the snapshot in a bounded history. Any failure cancels every resting
//! order so no stale ladder is left behind.
//!
//! ```text
//! Idle → SnapshotLoaded → PreUpdated → Pruned → Updated → Submitted → PostUpdated → Idle
//!   └──────────────── any error ────────────────→ Recovering → Idle
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ladder_core::{AssetPair, Clock, LiveOrders, Offer, Operation, OperationKind, Snapshot};
use ladder_filter::FilterPipeline;
use ladder_strategy::{Strategy, StrategyKind};
use ladder_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::TraderResult;
use crate::fills::FillTracker;
use crate::snapshot::load_snapshot;
use crate::venue::DynVenue;

/// `[trader]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderConfig {
    /// Delay between the start of consecutive ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Stop after this many ticks; run until shutdown when unset.
    #[serde(default)]
    pub fixed_iterations: Option<u64>,
    #[serde(default = "default_fill_poll_interval_ms")]
    pub fill_poll_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    5000
}

fn default_fill_poll_interval_ms() -> u64 {
    2000
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            fixed_iterations: None,
            fill_poll_interval_ms: default_fill_poll_interval_ms(),
        }
    }
}

impl TraderConfig {
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[must_use]
    pub fn fill_poll_interval(&self) -> Duration {
        Duration::from_millis(self.fill_poll_interval_ms)
    }
}

/// Where the current tick is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    Idle,
    SnapshotLoaded,
    PreUpdated,
    Pruned,
    Updated,
    Submitted,
    PostUpdated,
    Recovering,
}

/// Operation counts of one successful tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub prune_ops: usize,
    pub update_ops: usize,
    pub submitted: usize,
}

/// Success and failure counts since start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub successes: u64,
    pub failures: u64,
}

pub struct Trader {
    pair: AssetPair,
    venue: DynVenue,
    strategy: StrategyKind,
    filters: FilterPipeline,
    clock: Arc<dyn Clock>,
    config: TraderConfig,
    /// Oldest first, at most `strategy.max_history()` entries.
    history: Vec<Snapshot>,
    /// Orders believed to be resting: the snapshot's, then what survived pruning.
    live_cache: LiveOrders,
    phase: TickPhase,
    stats: LoopStats,
}

impl Trader {
    pub fn new(
        pair: AssetPair,
        venue: DynVenue,
        strategy: StrategyKind,
        filters: FilterPipeline,
        clock: Arc<dyn Clock>,
        config: TraderConfig,
    ) -> Self {
        Self {
            pair,
            venue,
            strategy,
            filters,
            clock,
            config,
            history: Vec::new(),
            live_cache: LiveOrders::default(),
            phase: TickPhase::Idle,
            stats: LoopStats::default(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    #[must_use]
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    #[must_use]
    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    #[must_use]
    pub fn live_cache(&self) -> &LiveOrders {
        &self.live_cache
    }

    /// Run one tick. On failure every resting order is cancelled before the
    /// error is returned.
    pub async fn tick(&mut self) -> TraderResult<TickReport> {
        let started = Instant::now();
        let result = self.run_tick().await;
        Metrics::tick_duration(started.elapsed().as_secs_f64());

        match result {
            Ok(report) => {
                self.stats.successes += 1;
                Metrics::update_loop(true);
                info!(
                    pair = %self.pair,
                    prune_ops = report.prune_ops,
                    update_ops = report.update_ops,
                    submitted = report.submitted,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "update loop completed"
                );
                Ok(report)
            }
            Err(e) => {
                error!(pair = %self.pair, phase = ?self.phase, error = %e, "update loop failed, deleting all offers");
                self.recover().await;
                self.stats.failures += 1;
                Metrics::update_loop(false);
                Err(e)
            }
        }
    }

    async fn run_tick(&mut self) -> TraderResult<TickReport> {
        self.phase = TickPhase::Idle;
        let snapshot = load_snapshot(self.venue.as_ref(), self.clock.as_ref()).await?;
        self.live_cache = snapshot.live.clone();
        Metrics::live_offers("sell", snapshot.live.sell.len());
        Metrics::live_offers("buy", snapshot.live.buy.len());
        self.phase = TickPhase::SnapshotLoaded;

        self.strategy.pre_update(&snapshot)?;
        self.phase = TickPhase::PreUpdated;

        let (prune_ops, live) = self.strategy.prune_existing_offers(&snapshot);
        record_ops("prune", &prune_ops);
        let prune_count = prune_ops.len();
        if !prune_ops.is_empty() {
            debug!(ops = prune_count, "submitting prune operations");
            self.venue.submit(prune_ops).await?;
        }
        self.live_cache = live.clone();
        self.phase = TickPhase::Pruned;

        self.venue.reset_tick_cache();
        let ops = self.strategy.update_with_ops(&self.history, &snapshot, &live)?;
        record_ops("update", &ops);
        let update_count = ops.len();
        self.phase = TickPhase::Updated;

        let ops = self.filters.apply(ops, &live)?;
        record_ops("submit", &ops);
        let submitted = ops.len();
        if !ops.is_empty() {
            for op in &ops {
                debug!(%op, "submitting");
            }
            self.venue.submit(ops).await?;
        }
        self.phase = TickPhase::Submitted;

        self.strategy.post_update(&self.history, &snapshot)?;
        self.phase = TickPhase::PostUpdated;

        self.push_history(snapshot);
        self.phase = TickPhase::Idle;
        Ok(TickReport {
            prune_ops: prune_count,
            update_ops: update_count,
            submitted,
        })
    }

    fn push_history(&mut self, snapshot: Snapshot) {
        let max = self.strategy.max_history();
        self.history.push(snapshot);
        if self.history.len() > max {
            let excess = self.history.len() - max;
            self.history.drain(..excess);
        }
    }

    /// Cancel resting orders one at a time and forget them.
    ///
    /// Offers are reloaded from the venue first and the cache stands in when
    /// that fails. A rejected cancel does not stop the rest.
    async fn recover(&mut self) {
        self.phase = TickPhase::Recovering;
        let cached = std::mem::take(&mut self.live_cache);
        let offers: Vec<Offer> = match self.venue.load_offers().await {
            Ok(offers) => offers,
            Err(e) => {
                warn!(error = %e, cached = cached.len(), "failed to reload offers, deleting cached offers");
                cached.iter().cloned().collect()
            }
        };

        if offers.is_empty() {
            info!("no resting offers to delete");
        } else {
            let mut failed = 0usize;
            for offer in &offers {
                if let Err(e) = self.venue.submit(vec![offer.cancel()]).await {
                    warn!(offer_id = %offer.id, error = %e, "failed to delete offer");
                    failed += 1;
                }
            }
            if failed == 0 {
                info!(count = offers.len(), "deleted all resting offers");
            } else {
                warn!(count = offers.len(), failed, "some offers are still resting");
            }
            Metrics::recovery(failed == 0);
        }
        self.phase = TickPhase::Idle;
    }

    /// Reload resting orders from the venue and cancel all of them.
    pub async fn delete_all_offers(&mut self) -> TraderResult<usize> {
        let offers = self.venue.load_offers().await?;
        self.live_cache.clear();
        if offers.is_empty() {
            return Ok(0);
        }
        let count = offers.len();
        self.venue
            .submit(offers.iter().map(|o| o.cancel()).collect())
            .await?;
        info!(count, "deleted all resting offers");
        Ok(count)
    }

    /// Tick every `tick_interval` until `fixed_iterations` ticks have run or
    /// `shutdown` is cancelled.
    ///
    /// The fill tracker, if given, runs alongside and is stopped first on
    /// exit. Resting orders are deleted when exiting on shutdown; a run that
    /// completes its fixed iterations leaves them in place.
    pub async fn run(
        &mut self,
        shutdown: CancellationToken,
        fills: Option<FillTracker>,
    ) -> TraderResult<LoopStats> {
        let fill_token = shutdown.child_token();
        let fill_handle = fills.map(|tracker| tracker.spawn(fill_token.clone()));

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            pair = %self.pair,
            tick_interval_ms = self.config.tick_interval_ms,
            fixed_iterations = ?self.config.fixed_iterations,
            "starting update loop"
        );

        let mut iterations = 0u64;
        let mut interrupted = false;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        debug!(iteration = iterations + 1, error = %e, "tick failed");
                    }
                    iterations += 1;
                    if self.config.fixed_iterations.is_some_and(|n| iterations >= n) {
                        info!(iterations, "reached fixed iterations");
                        break;
                    }
                }
                () = shutdown.cancelled() => {
                    info!(iterations, "shutdown requested");
                    interrupted = true;
                    break;
                }
            }
        }

        fill_token.cancel();
        if let Some(handle) = fill_handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "fill tracker task failed");
            }
        }

        if interrupted {
            self.delete_all_offers().await?;
        }
        info!(successes = self.stats.successes, failures = self.stats.failures, "update loop stopped");
        Ok(self.stats)
    }
}

fn record_ops(phase: &str, ops: &[Operation]) {
    let mut counts: HashMap<OperationKind, usize> = HashMap::new();
    for op in ops {
        *counts.entry(op.kind()).or_default() += 1;
    }
    for (kind, count) in counts {
        Metrics::ops(phase, kind.as_str(), count);
    }
}
