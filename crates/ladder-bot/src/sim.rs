//! Random-walk market for the paper venue.
//!
//! Each step moves the venue's reference price by a uniform relative shock
//! within `±volatility` and fills whatever resting orders it crosses.

use crate::config::SimConfig;
use ladder_core::{Clock, Price, Trade};
use ladder_trader::PaperVenue;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Reference prices are kept to this many decimal places.
const REFERENCE_DP: u32 = 8;

pub struct MarketSim {
    venue: Arc<PaperVenue>,
    clock: Arc<dyn Clock>,
    rng: SmallRng,
    volatility: Decimal,
    step: Duration,
    steps: u64,
}

impl MarketSim {
    pub fn new(venue: Arc<PaperVenue>, clock: Arc<dyn Clock>, config: &SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            venue,
            clock,
            rng,
            volatility: config.volatility,
            step: config.step(),
            steps: 0,
        }
    }

    /// Move the reference once and return the resulting fills.
    pub fn step(&mut self) -> Vec<Trade> {
        let shock = Decimal::from_f64(self.rng.gen_range(-1.0..=1.0)).unwrap_or_default();
        let current = self.venue.reference();
        let next = (current.inner() * (Decimal::ONE + shock * self.volatility))
            .round_dp(REFERENCE_DP);
        let next = if next > Decimal::ZERO {
            Price::new(next)
        } else {
            current
        };

        let trades = self.venue.match_price(next, self.clock.now());
        self.steps += 1;
        debug!(step = self.steps, from = %current, to = %next, fills = trades.len(), "market step");
        trades
    }

    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Step every `step_ms` until `shutdown` is cancelled.
    pub fn spawn(mut self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.step);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick fires immediately; skip it so the trader quotes first
            interval.tick().await;
            info!(step_ms = self.step.as_millis() as u64, "market simulator started");
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.step();
                    }
                    () = shutdown.cancelled() => {
                        info!(steps = self.steps, reference = %self.venue.reference(), "market simulator stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ladder_core::{AssetPair, ManualClock, Operation, OrderSide, Size};
    use ladder_trader::{PaperConfig, Venue};
    use rust_decimal_macros::dec;

    fn venue() -> Arc<PaperVenue> {
        let config = PaperConfig {
            base_balance: dec!(1000),
            quote_balance: dec!(1000),
            reference_price: Price::new(dec!(1)),
            maker_only: false,
            slippage: dec!(0.001),
            level_amount: dec!(1000),
        };
        Arc::new(PaperVenue::new(AssetPair::new("XLM", "USD"), config).unwrap())
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()))
    }

    fn sim_config(volatility: Decimal) -> SimConfig {
        SimConfig {
            enabled: true,
            step_ms: 10,
            volatility,
            seed: Some(42),
        }
    }

    #[test]
    fn test_moves_stay_within_volatility() {
        let venue = venue();
        let mut sim = MarketSim::new(venue.clone(), clock(), &sim_config(dec!(0.01)));
        for _ in 0..50 {
            let before = venue.reference().inner();
            sim.step();
            let after = venue.reference().inner();
            assert!((after - before).abs() <= before * dec!(0.01) + dec!(0.00000001));
        }
        assert_eq!(sim.steps(), 50);
    }

    #[test]
    fn test_same_seed_same_walk() {
        let a = venue();
        let b = venue();
        let mut sim_a = MarketSim::new(a.clone(), clock(), &sim_config(dec!(0.05)));
        let mut sim_b = MarketSim::new(b.clone(), clock(), &sim_config(dec!(0.05)));
        for _ in 0..10 {
            sim_a.step();
            sim_b.step();
        }
        assert_eq!(a.reference(), b.reference());
    }

    #[test]
    fn test_zero_volatility_fills_crossed_orders() {
        let venue = venue();
        tokio_test::block_on(venue.submit(vec![Operation::Create {
            side: OrderSide::Sell,
            price: Price::new(dec!(0.99)),
            amount: Size::new(dec!(10)),
        }]))
        .unwrap();

        let mut sim = MarketSim::new(venue.clone(), clock(), &sim_config(Decimal::ZERO));
        let trades = sim.step();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, OrderSide::Sell);
        assert!(venue.open_offers().is_empty());
    }
}
