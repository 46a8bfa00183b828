//! Main application orchestration.
//!
//! Wires the paper venue, the fill tracker and trade ledger, the configured
//! strategy and filter pipeline into a [`Trader`], and runs it until the
//! configured iterations are done or shutdown is requested.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::sim::MarketSim;
use ladder_core::{Clock, SystemClock};
use ladder_filter::FilterPipeline;
use ladder_strategy::{build_strategy, StrategyContext};
use ladder_telemetry::Metrics;
use ladder_trader::{
    FillTracker, LoggingFillHandler, LoopStats, PaperVenue, TradeLedger, Trader,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Name under which the paper venue is registered as ticker and book source.
pub const PAPER_SOURCE: &str = "paper";

/// Main application.
pub struct Application {
    config: AppConfig,
    clock: Arc<dyn Clock>,
    venue: Arc<PaperVenue>,
    ledger: Arc<TradeLedger>,
    trader: Trader,
    fills: Option<FillTracker>,
}

impl Application {
    /// Create a new application on the wall clock.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        config.validate()?;

        let venue = Arc::new(PaperVenue::new(config.pair.clone(), config.paper.clone())?);
        let ledger = Arc::new(TradeLedger::new());

        let mut ctx = StrategyContext::new(
            config.pair.clone(),
            config.constraints.clone(),
            ledger.clone(),
            clock.clone(),
        );
        ctx.register_ticker(PAPER_SOURCE, venue.clone());
        ctx.register_book(PAPER_SOURCE, venue.clone());

        let strategy = build_strategy(&config.strategy, &ctx)?;
        let filters =
            FilterPipeline::from_config(&config.filters, config.constraints.clone(), &ctx.books)?;

        let mut fills = FillTracker::new(venue.clone(), config.trader.fill_poll_interval());
        fills.register_handler(ledger.clone());
        fills.register_handler(Arc::new(LoggingFillHandler));

        info!(
            pair = %config.pair,
            strategy = %config.strategy.name,
            filters = ?filters.names(),
            tick_interval_ms = config.trader.tick_interval_ms,
            sim = config.sim.enabled,
            "Application configured"
        );

        let trader = Trader::new(
            config.pair.clone(),
            venue.clone(),
            strategy,
            filters,
            clock.clone(),
            config.trader.clone(),
        );

        Ok(Self {
            config,
            clock,
            venue,
            ledger,
            trader,
            fills: Some(fills),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn venue(&self) -> &Arc<PaperVenue> {
        &self.venue
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<TradeLedger> {
        &self.ledger
    }

    #[must_use]
    pub fn trader(&self) -> &Trader {
        &self.trader
    }

    pub fn trader_mut(&mut self) -> &mut Trader {
        &mut self.trader
    }

    /// Run the update loop, with the market simulator alongside when enabled.
    pub async fn run(&mut self, shutdown: CancellationToken) -> AppResult<LoopStats> {
        let sim_token = shutdown.child_token();
        let sim_handle = self.config.sim.enabled.then(|| {
            MarketSim::new(self.venue.clone(), self.clock.clone(), &self.config.sim)
                .spawn(sim_token.clone())
        });

        let result = self.trader.run(shutdown, self.fills.take()).await;

        sim_token.cancel();
        if let Some(handle) = sim_handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "market simulator task failed");
            }
        }

        let stats = result?;
        info!(
            successes = stats.successes,
            failures = stats.failures,
            reference = %self.venue.reference(),
            open_offers = self.venue.open_offers().len(),
            "Shutting down"
        );
        match Metrics::render() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }
        Ok(stats)
    }
}

/// Token cancelled on the first Ctrl-C.
pub fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let signal = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });
    token
}
