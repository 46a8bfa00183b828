//! Fixed-spread ladder around a centre price.
//!
//! Each configured level sits at `center * (1 + spread)` with an amount of
//! `amount * amount_of_a_base`. An optional daily limit shrinks the ladder
//! as the day's executed volume approaches it.

use std::sync::Arc;

use ladder_core::clock::trading_date;
use ladder_core::{Clock, Level, OrderConstraints, OrderSide, Price, Size};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LevelsError, LevelsResult};
use crate::feed::FeedPair;
use crate::offset::RateOffset;
use crate::provider::LevelProvider;
use crate::volume::{CapAsset, DailyLimit, DailyVolumeSource};

/// Fraction of a daily limit treated as "reached".
const DAILY_LIMIT_TOLERANCE: Decimal = dec!(0.001);

/// One configured rung: spread from centre and amount multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticLevel {
    pub spread: Decimal,
    pub amount: Decimal,
}

struct DailyCap {
    limit: DailyLimit,
    source: Arc<dyn DailyVolumeSource>,
    clock: Arc<dyn Clock>,
}

/// Level provider for a static ladder.
pub struct StaticSpreadLevelProvider {
    side: OrderSide,
    levels: Vec<StaticLevel>,
    amount_of_base: Decimal,
    offset: RateOffset,
    feed: FeedPair,
    constraints: OrderConstraints,
    min_price: Option<Price>,
    daily_cap: Option<DailyCap>,
}

impl StaticSpreadLevelProvider {
    /// `side` is the side whose ladder this produces; bid ladders are built
    /// in the reciprocal frame and `feed` must already quote that frame.
    pub fn new(
        side: OrderSide,
        levels: Vec<StaticLevel>,
        amount_of_base: Decimal,
        feed: FeedPair,
        constraints: OrderConstraints,
    ) -> LevelsResult<Self> {
        if amount_of_base.is_sign_negative() {
            return Err(LevelsError::InvalidConfig(format!(
                "amount_of_a_base must not be negative, got {amount_of_base}"
            )));
        }
        if let Some(bad) = levels.iter().find(|l| l.spread <= dec!(-1)) {
            return Err(LevelsError::InvalidConfig(format!(
                "spread {} would produce a non-positive price",
                bad.spread
            )));
        }
        Ok(Self {
            side,
            levels,
            amount_of_base,
            offset: RateOffset::default(),
            feed,
            constraints,
            min_price: None,
            daily_cap: None,
        })
    }

    #[must_use]
    pub fn with_offset(mut self, offset: RateOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Skip levels priced below `min_price` (seller frame).
    #[must_use]
    pub fn with_min_price(mut self, min_price: Option<Price>) -> Self {
        self.min_price = min_price.filter(Price::is_positive);
        self
    }

    #[must_use]
    pub fn with_daily_limit(
        mut self,
        limit: DailyLimit,
        source: Arc<dyn DailyVolumeSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        self.daily_cap = Some(DailyCap {
            limit,
            source,
            clock,
        });
        self
    }

    fn frame_price(&self, raw: Decimal) -> Price {
        // bid prices are quantized once converted back to pair terms
        match self.side {
            OrderSide::Sell => self.constraints.price(Price::new(raw)),
            OrderSide::Buy => Price::new(raw),
        }
    }

    /// Remaining allowance today, or `None` once the limit is reached.
    fn remaining_allowance(&self, cap: &DailyCap) -> LevelsResult<Option<Decimal>> {
        let date = trading_date(cap.clock.now());
        let volume = cap.source.daily_volume(date, self.side)?;
        let sold = cap.limit.sold(&volume);
        info!(
            side = %self.side,
            %date,
            base_sold = %volume.base_sold,
            quote_cost = %volume.quote_cost,
            limit = %cap.limit.amount,
            asset = ?cap.limit.asset,
            "daily volume so far"
        );
        if sold >= cap.limit.amount * (Decimal::ONE - DAILY_LIMIT_TOLERANCE) {
            info!(side = %self.side, "daily limit reached, returning no levels");
            return Ok(None);
        }
        Ok(Some(cap.limit.amount - sold))
    }
}

/// Cap `desired` (base units) so the running total stays within `remaining`.
fn cap_amount(
    asset: CapAsset,
    remaining: Decimal,
    base_so_far: Decimal,
    desired: Decimal,
    price: Decimal,
) -> Decimal {
    match asset {
        CapAsset::Base => desired.min(remaining - base_so_far),
        CapAsset::Quote => {
            let left = remaining - base_so_far * price;
            if desired * price <= left {
                desired
            } else if price.is_zero() {
                Decimal::ZERO
            } else {
                left / price
            }
        }
    }
}

impl LevelProvider for StaticSpreadLevelProvider {
    fn get_levels(&mut self, _max_base: Decimal, _max_quote: Decimal) -> LevelsResult<Vec<Level>> {
        let center = self.feed.center_price()?;
        debug!(side = %self.side, %center, "center price");

        let allowance = match &self.daily_cap {
            Some(cap) => match self.remaining_allowance(cap)? {
                Some(remaining) => Some((cap.limit.asset, remaining)),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let (center, adjusted) = self.offset.apply(center);
        if adjusted {
            debug!(side = %self.side, %center, "center price (adjusted)");
        }

        let mut levels = Vec::with_capacity(self.levels.len());
        let mut base_so_far = Decimal::ZERO;
        for sl in &self.levels {
            let price = self.frame_price(center.inner() * (Decimal::ONE + sl.spread));
            if self.min_price.is_some_and(|min| price < min) {
                debug!(%price, "skipping level below min price");
                continue;
            }

            let amount = self
                .constraints
                .volume(Size::new(sl.amount * self.amount_of_base))
                .inner();
            let capped = match allowance {
                Some((asset, remaining)) => {
                    cap_amount(asset, remaining, base_so_far, amount, price.inner())
                }
                None => amount,
            };
            if capped <= Decimal::ZERO {
                break;
            }

            let capped = self.constraints.volume(Size::new(capped));
            levels.push(Level::new(price, capped));
            base_so_far += capped.inner();
        }
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FixedFeed;
    use crate::volume::{DailyVolume, MockDailyVolumeSource};
    use chrono::TimeZone;
    use ladder_core::ManualClock;

    fn pair(price: Decimal) -> FeedPair {
        FeedPair::new(
            Arc::new(FixedFeed(Price::new(price))),
            Arc::new(FixedFeed(Price::ONE)),
        )
    }

    fn ladder() -> Vec<StaticLevel> {
        vec![
            StaticLevel {
                spread: dec!(0.01),
                amount: dec!(1),
            },
            StaticLevel {
                spread: dec!(0.02),
                amount: dec!(2),
            },
            StaticLevel {
                spread: dec!(0.05),
                amount: dec!(4),
            },
        ]
    }

    fn provider() -> StaticSpreadLevelProvider {
        StaticSpreadLevelProvider::new(
            OrderSide::Sell,
            ladder(),
            dec!(100),
            pair(dec!(2)),
            OrderConstraints::new(4, 2, Size::ZERO),
        )
        .unwrap()
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
        ))
    }

    fn volume(base_sold: Decimal, quote_cost: Decimal) -> Arc<dyn DailyVolumeSource> {
        let mut source = MockDailyVolumeSource::new();
        source.expect_daily_volume().returning(move |_, _| {
            Ok(DailyVolume {
                base_sold,
                quote_cost,
            })
        });
        Arc::new(source)
    }

    #[test]
    fn test_static_ladder_prices_and_amounts() {
        let levels = provider().get_levels(dec!(1000), dec!(1000)).unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].price.0, dec!(2.02));
        assert_eq!(levels[0].amount.0, dec!(100));
        assert_eq!(levels[1].price.0, dec!(2.04));
        assert_eq!(levels[2].price.0, dec!(2.10));
        assert_eq!(levels[2].amount.0, dec!(400));
    }

    #[test]
    fn test_min_price_skips_levels() {
        let mut p = provider().with_min_price(Some(Price::new(dec!(2.03))));
        let levels = p.get_levels(dec!(0), dec!(0)).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].price.0, dec!(2.04));
    }

    #[test]
    fn test_offset_applied_before_spread() {
        let mut p = provider().with_offset(RateOffset {
            percent: dec!(0.5),
            ..Default::default()
        });
        let levels = p.get_levels(dec!(0), dec!(0)).unwrap();
        assert_eq!(levels[0].price.0, dec!(3.03));
    }

    #[test]
    fn test_base_daily_limit_caps_and_stops() {
        let limit = DailyLimit {
            amount: dec!(350),
            asset: CapAsset::Base,
        };
        let mut p = provider().with_daily_limit(limit, volume(dec!(100), dec!(0)), clock());
        let levels = p.get_levels(dec!(0), dec!(0)).unwrap();
        // 250 remaining: 100 then 150, third level gets nothing
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].amount.0, dec!(100));
        assert_eq!(levels[1].amount.0, dec!(150));
    }

    #[test]
    fn test_quote_daily_limit_converts_to_base() {
        let limit = DailyLimit {
            amount: dec!(404),
            asset: CapAsset::Quote,
        };
        let mut p = provider().with_daily_limit(limit, volume(dec!(0), dec!(0)), clock());
        let levels = p.get_levels(dec!(0), dec!(0)).unwrap();
        // level 0: 100 * 2.02 = 202 fits; level 1: left = 404 - 100 * 2.04 = 200
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].amount.0, dec!(98.04));
    }

    #[test]
    fn test_daily_limit_reached_within_tolerance() {
        let limit = DailyLimit {
            amount: dec!(1000),
            asset: CapAsset::Base,
        };
        let mut p = provider().with_daily_limit(limit, volume(dec!(999.5), dec!(0)), clock());
        assert!(p.get_levels(dec!(0), dec!(0)).unwrap().is_empty());
    }

    #[test]
    fn test_volume_failure_fails_call() {
        let mut source = MockDailyVolumeSource::new();
        source
            .expect_daily_volume()
            .returning(|_, _| Err(LevelsError::Volume("db down".to_string())));
        let limit = DailyLimit {
            amount: dec!(1),
            asset: CapAsset::Base,
        };
        let mut p = provider().with_daily_limit(limit, Arc::new(source), clock());
        assert!(matches!(
            p.get_levels(dec!(0), dec!(0)),
            Err(LevelsError::Volume(_))
        ));
    }

    #[test]
    fn test_rejects_negative_amount() {
        let result = StaticSpreadLevelProvider::new(
            OrderSide::Sell,
            ladder(),
            dec!(-1),
            pair(dec!(1)),
            OrderConstraints::default(),
        );
        assert!(result.is_err());
    }
}
