//! Time-paced sell ladder.
//!
//! The trading day is cut into fixed buckets. Each bucket gets an even share
//! of the day's base capacity plus part of whatever earlier buckets under- or
//! over-sold, and every tick quotes one randomly sized child order against
//! what is left in the current bucket.

pub mod bucket;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Weekday};
use ladder_core::clock::trading_date;
use ladder_core::{Clock, Level, OrderConstraints, OrderSide, Size, SECONDS_PER_DAY};
use ladder_telemetry::Metrics;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LevelsError, LevelsResult};
use crate::feed::FeedPair;
use crate::offset::RateOffset;
use crate::provider::LevelProvider;
use crate::volume::DailyVolumeSource;

pub use bucket::{bucket_uuid, first_geometric_term, Bucket, DynamicBucketValues};
pub use state::{advance, Round, TwapInputs, TwapParams, TwapState};

/// `[strategy.sell_twap]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwapConfig {
    pub num_hours_to_sell: u32,
    pub parent_bucket_size_seconds: i64,
    #[serde(default = "default_fraction_one")]
    pub distribute_surplus_over_remaining_intervals_percent_ceiling: Decimal,
    #[serde(default = "default_smoothing")]
    pub exponential_smoothing_factor: Decimal,
    #[serde(default = "default_min_child")]
    pub min_child_order_size_percentage: Decimal,
    /// Base units to sell per day.
    pub day_base_capacity: Decimal,
    /// Per-weekday replacements for `day_base_capacity`, keyed `mon`..`sun`.
    #[serde(default)]
    pub day_base_capacity_overrides: HashMap<String, Decimal>,
    /// Fixed seed for reproducible child order sizes.
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub rate_offset: RateOffset,
}

fn default_fraction_one() -> Decimal {
    Decimal::ONE
}

fn default_smoothing() -> Decimal {
    Decimal::new(5, 1)
}

fn default_min_child() -> Decimal {
    Decimal::new(1, 1)
}

impl TwapConfig {
    /// Check ranges and derive pacing parameters.
    pub fn params(&self) -> LevelsResult<TwapParams> {
        if self.num_hours_to_sell == 0 || self.num_hours_to_sell > 24 {
            return Err(LevelsError::InvalidConfig(format!(
                "invalid number of hours to sell, expected 0 < num_hours_to_sell <= 24; was {}",
                self.num_hours_to_sell
            )));
        }
        let size = self.parent_bucket_size_seconds;
        if size <= 0 || size > SECONDS_PER_DAY {
            return Err(LevelsError::InvalidConfig(format!(
                "invalid parent_bucket_size_seconds, expected 0 < size <= {SECONDS_PER_DAY}; was {size}"
            )));
        }
        if SECONDS_PER_DAY % size != 0 {
            return Err(LevelsError::InvalidConfig(format!(
                "parent_bucket_size_seconds must divide {SECONDS_PER_DAY} evenly; was {size}"
            )));
        }
        for (name, value) in [
            (
                "distribute_surplus_over_remaining_intervals_percent_ceiling",
                self.distribute_surplus_over_remaining_intervals_percent_ceiling,
            ),
            ("exponential_smoothing_factor", self.exponential_smoothing_factor),
            ("min_child_order_size_percentage", self.min_child_order_size_percentage),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(LevelsError::InvalidConfig(format!(
                    "{name} must be within [0, 1]; was {value}"
                )));
            }
        }
        if self.day_base_capacity.is_sign_negative() {
            return Err(LevelsError::InvalidConfig(format!(
                "day_base_capacity must not be negative; was {}",
                self.day_base_capacity
            )));
        }

        Ok(TwapParams {
            bucket_size_seconds: size,
            num_hours_to_sell: self.num_hours_to_sell,
            surplus_ceiling: self.distribute_surplus_over_remaining_intervals_percent_ceiling,
            smoothing_factor: self.exponential_smoothing_factor,
            min_child_fraction: self.min_child_order_size_percentage,
        })
    }

    fn capacity_overrides(&self) -> LevelsResult<HashMap<Weekday, Decimal>> {
        self.day_base_capacity_overrides
            .iter()
            .map(|(day, capacity)| {
                let weekday = day.parse::<Weekday>().map_err(|_| {
                    LevelsError::InvalidConfig(format!("unknown weekday '{day}'"))
                })?;
                Ok((weekday, *capacity))
            })
            .collect()
    }
}

/// Sell-side TWAP level provider.
pub struct SellTwapLevelProvider {
    params: TwapParams,
    state: TwapState,
    day_base_capacity: Decimal,
    capacity_overrides: HashMap<Weekday, Decimal>,
    offset: RateOffset,
    feed: FeedPair,
    volume: Arc<dyn DailyVolumeSource>,
    clock: Arc<dyn Clock>,
    rng: SmallRng,
    constraints: OrderConstraints,
}

impl SellTwapLevelProvider {
    pub fn new(
        config: &TwapConfig,
        feed: FeedPair,
        volume: Arc<dyn DailyVolumeSource>,
        clock: Arc<dyn Clock>,
        constraints: OrderConstraints,
    ) -> LevelsResult<Self> {
        let params = config.params()?;
        let capacity_overrides = config.capacity_overrides()?;
        let rng = match config.random_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(Self {
            params,
            state: TwapState::default(),
            day_base_capacity: config.day_base_capacity,
            capacity_overrides,
            offset: config.rate_offset,
            feed,
            volume,
            clock,
            rng,
            constraints,
        })
    }

    /// Bucket used by the most recent round.
    #[must_use]
    pub fn active_bucket(&self) -> Option<&Bucket> {
        self.state.bucket.as_ref()
    }

    fn capacity_for(&self, weekday: Weekday) -> Decimal {
        self.capacity_overrides
            .get(&weekday)
            .copied()
            .unwrap_or(self.day_base_capacity)
    }
}

impl LevelProvider for SellTwapLevelProvider {
    fn get_levels(&mut self, _max_base: Decimal, _max_quote: Decimal) -> LevelsResult<Vec<Level>> {
        let now = self.clock.now();
        let day_base_capacity = self.capacity_for(now.weekday());
        let volume = self
            .volume
            .daily_volume(trading_date(now), OrderSide::Sell)?;

        let price = self.feed.center_price()?;
        let (price, adjusted) = self.offset.apply(price);
        if adjusted {
            debug!(%price, "feed price (adjusted)");
        }

        let inputs = TwapInputs {
            now,
            day_base_capacity,
            day_base_sold: volume.base_sold,
            price,
        };
        let (state, round) = state::advance(&self.params, &self.state, &inputs, &mut self.rng)?;
        if let Some(bucket) = &state.bucket {
            info!(%bucket, "twap bucket");
            Metrics::twap_bucket(
                bucket.id,
                bucket.base_capacity.to_f64().unwrap_or_default(),
                bucket.dynamic.base_sold.to_f64().unwrap_or_default(),
            );
        }
        info!(
            round_id = round.id,
            bucket_id = round.bucket_id,
            bucket_uuid = %round.bucket_uuid,
            seconds_into_day = round.seconds_into_day,
            capped_amount = %round.capped_amount,
            price = %round.price,
            "twap round"
        );
        self.state = state;

        Ok(vec![Level::new(
            self.constraints.price(round.price),
            self.constraints.volume(Size::new(round.capped_amount)),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FixedFeed;
    use crate::volume::{DailyVolume, MockDailyVolumeSource};
    use chrono::{Duration, TimeZone, Utc};
    use ladder_core::{ManualClock, Price};
    use rust_decimal_macros::dec;

    const CONFIG: &str = r#"
num_hours_to_sell = 24
parent_bucket_size_seconds = 3600
distribute_surplus_over_remaining_intervals_percent_ceiling = "0.5"
exponential_smoothing_factor = "0.5"
min_child_order_size_percentage = "0.2"
day_base_capacity = "8640"
random_seed = 11

[day_base_capacity_overrides]
sat = "0"
"#;

    fn config() -> TwapConfig {
        toml::from_str(CONFIG).unwrap()
    }

    fn feed() -> FeedPair {
        FeedPair::new(
            Arc::new(FixedFeed(Price::new(dec!(0.123456789)))),
            Arc::new(FixedFeed(Price::ONE)),
        )
    }

    fn volume(sold: Decimal) -> Arc<dyn DailyVolumeSource> {
        let mut source = MockDailyVolumeSource::new();
        source
            .expect_daily_volume()
            .withf(|_, side| *side == OrderSide::Sell)
            .returning(move |_, _| {
                Ok(DailyVolume {
                    base_sold: sold,
                    quote_cost: Decimal::ZERO,
                })
            });
        Arc::new(source)
    }

    #[test]
    fn test_config_parses_with_defaults() {
        let minimal: TwapConfig = toml::from_str(
            "num_hours_to_sell = 12\nparent_bucket_size_seconds = 900\nday_base_capacity = \"100\"",
        )
        .unwrap();
        assert_eq!(minimal.exponential_smoothing_factor, dec!(0.5));
        assert_eq!(minimal.min_child_order_size_percentage, dec!(0.1));
        assert!(minimal.random_seed.is_none());
        assert_eq!(minimal.params().unwrap().total_buckets_to_sell(), 48);
    }

    #[test]
    fn test_config_validation() {
        let mut c = config();
        c.num_hours_to_sell = 25;
        assert!(c.params().is_err());

        let mut c = config();
        c.parent_bucket_size_seconds = 7000;
        assert!(c.params().is_err());

        let mut c = config();
        c.parent_bucket_size_seconds = 0;
        assert!(c.params().is_err());

        let mut c = config();
        c.exponential_smoothing_factor = dec!(1.5);
        assert!(c.params().is_err());

        let mut c = config();
        c.min_child_order_size_percentage = dec!(-0.1);
        assert!(c.params().is_err());

        let mut c = config();
        c.day_base_capacity_overrides
            .insert("someday".to_string(), dec!(1));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let built = SellTwapLevelProvider::new(
            &c,
            feed(),
            volume(Decimal::ZERO),
            clock,
            OrderConstraints::default(),
        );
        assert!(built.is_err());
    }

    #[test]
    fn test_single_quantized_level() {
        // Monday
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 10, 15, 0).unwrap(),
        ));
        let mut provider = SellTwapLevelProvider::new(
            &config(),
            feed(),
            volume(dec!(100)),
            clock.clone(),
            OrderConstraints::new(4, 2, Size::ZERO),
        )
        .unwrap();

        let levels = provider.get_levels(dec!(1000), dec!(0)).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].price.0, dec!(0.1235));
        assert!(levels[0].amount.0 >= dec!(72) && levels[0].amount.0 <= dec!(360));
        assert_eq!(levels[0].amount.0, levels[0].amount.0.round_dp(2));
        assert_eq!(provider.active_bucket().unwrap().id, 10);

        clock.advance(Duration::hours(1));
        provider.get_levels(dec!(1000), dec!(0)).unwrap();
        let bucket = provider.active_bucket().unwrap();
        assert_eq!(bucket.id, 11);
        assert_eq!(bucket.dynamic.round_id, 1);
    }

    #[test]
    fn test_weekday_override_capacity() {
        // Saturday, capacity overridden to zero
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 7, 9, 0, 0).unwrap(),
        ));
        let mut provider = SellTwapLevelProvider::new(
            &config(),
            feed(),
            volume(Decimal::ZERO),
            clock,
            OrderConstraints::default(),
        )
        .unwrap();
        let levels = provider.get_levels(dec!(1000), dec!(0)).unwrap();
        assert_eq!(levels[0].amount.0, Decimal::ZERO);
    }

    #[test]
    fn test_volume_failure_fails_call() {
        let mut source = MockDailyVolumeSource::new();
        source
            .expect_daily_volume()
            .returning(|_, _| Err(LevelsError::Volume("unreachable".to_string())));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let mut provider = SellTwapLevelProvider::new(
            &config(),
            feed(),
            Arc::new(source),
            clock,
            OrderConstraints::default(),
        )
        .unwrap();
        assert!(provider.get_levels(dec!(1), dec!(1)).is_err());
        assert!(provider.active_bucket().is_none());
    }
}
