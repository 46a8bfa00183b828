//! Fill tracking.
//!
//! A [`FillTracker`] polls the venue for new trades and hands each one to
//! every registered [`FillHandler`]. Handlers only observe; they never feed
//! back into the running tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use ladder_core::clock::trading_date;
use ladder_core::{OrderSide, Trade};
use ladder_levels::{DailyVolume, DailyVolumeSource, LevelsResult};
use ladder_telemetry::Metrics;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::TraderResult;
use crate::venue::DynVenue;

/// Receives every fill seen by a [`FillTracker`].
pub trait FillHandler: Send + Sync {
    fn handle_fill(&self, trade: &Trade) -> TraderResult<()>;
}

pub struct FillTracker {
    venue: DynVenue,
    handlers: Vec<Arc<dyn FillHandler>>,
    poll_interval: Duration,
    cursor: Option<u64>,
}

impl FillTracker {
    pub fn new(venue: DynVenue, poll_interval: Duration) -> Self {
        Self {
            venue,
            handlers: Vec::new(),
            poll_interval,
            cursor: None,
        }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn FillHandler>) {
        self.handlers.push(handler);
    }

    /// Sequence number of the last trade delivered.
    #[must_use]
    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    /// Fetch and dispatch new trades once. Returns how many were seen.
    ///
    /// A failing handler is logged and does not stop delivery to the others.
    pub async fn poll_once(&mut self) -> TraderResult<usize> {
        let trades = self.venue.trades_since(self.cursor).await?;
        for trade in &trades {
            for handler in &self.handlers {
                if let Err(e) = handler.handle_fill(trade) {
                    warn!(seq = trade.seq, error = %e, "fill handler failed");
                }
            }
            self.cursor = Some(self.cursor.map_or(trade.seq, |c| c.max(trade.seq)));
        }
        if !trades.is_empty() {
            debug!(count = trades.len(), cursor = ?self.cursor, "dispatched fills");
        }
        Ok(trades.len())
    }

    /// Poll until `shutdown` is cancelled.
    pub fn spawn(mut self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_ms = self.poll_interval.as_millis() as u64, "fill tracker started");
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.poll_once().await {
                            warn!(error = %e, "fill poll failed");
                        }
                    }
                    () = shutdown.cancelled() => {
                        info!(cursor = ?self.cursor, "fill tracker stopped");
                        break;
                    }
                }
            }
        })
    }
}

/// Per-day executed volume, kept in each side's seller frame.
///
/// Serves as the [`DailyVolumeSource`] behind daily sell caps and TWAP
/// pacing.
#[derive(Debug, Default)]
pub struct TradeLedger {
    days: RwLock<HashMap<(NaiveDate, OrderSide), DailyVolume>>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, trade: &Trade) {
        let notional = trade.amount.notional(trade.price);
        let (given, received) = match trade.side {
            OrderSide::Sell => (trade.amount.inner(), notional),
            OrderSide::Buy => (notional, trade.amount.inner()),
        };
        let mut days = self.days.write();
        let volume = days
            .entry((trading_date(trade.executed_at), trade.side))
            .or_default();
        volume.base_sold += given;
        volume.quote_cost += received;
    }
}

impl FillHandler for TradeLedger {
    fn handle_fill(&self, trade: &Trade) -> TraderResult<()> {
        self.record(trade);
        Ok(())
    }
}

impl DailyVolumeSource for TradeLedger {
    fn daily_volume(&self, date: NaiveDate, side: OrderSide) -> LevelsResult<DailyVolume> {
        Ok(self
            .days
            .read()
            .get(&(date, side))
            .copied()
            .unwrap_or_default())
    }
}

/// Logs one line per fill.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingFillHandler;

impl FillHandler for LoggingFillHandler {
    fn handle_fill(&self, trade: &Trade) -> TraderResult<()> {
        info!(
            seq = trade.seq,
            side = %trade.side,
            price = %trade.price,
            amount = %trade.amount,
            executed_at = %trade.executed_at,
            "fill"
        );
        Metrics::fill(&trade.side.to_string());
        Ok(())
    }
}
