//! Pure TWAP state transition.
//!
//! [`advance`] takes the previous [`TwapState`], the inputs observed this tick
//! and a random source, and returns the next state plus the [`Round`] to quote.
//! Nothing here reads the wall clock or performs I/O.

use chrono::{DateTime, Duration, Utc};
use ladder_core::clock::{day_start, seconds_into_day};
use ladder_core::{Price, SECONDS_PER_DAY};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use super::bucket::{first_geometric_term, Bucket, DynamicBucketValues};
use crate::error::{LevelsError, LevelsResult};

/// Resolution of the uniform draw between min order size and remaining.
const DRAW_SCALE: u32 = 9;
const DRAW_MAX: i64 = 1_000_000_000;

/// Validated pacing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwapParams {
    pub bucket_size_seconds: i64,
    pub num_hours_to_sell: u32,
    pub surplus_ceiling: Decimal,
    pub smoothing_factor: Decimal,
    pub min_child_fraction: Decimal,
}

impl TwapParams {
    #[must_use]
    pub fn total_buckets(&self) -> i64 {
        SECONDS_PER_DAY / self.bucket_size_seconds
    }

    /// Buckets the day's capacity is spread over.
    #[must_use]
    pub fn total_buckets_to_sell(&self) -> i64 {
        let seconds = i64::from(self.num_hours_to_sell) * 3600;
        (seconds + self.bucket_size_seconds - 1) / self.bucket_size_seconds
    }
}

/// Memory carried between ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwapState {
    pub bucket: Option<Bucket>,
    pub previous_round_id: Option<u64>,
}

/// Everything observed for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TwapInputs {
    pub now: DateTime<Utc>,
    pub day_base_capacity: Decimal,
    /// Base sold so far today, per the daily volume source.
    pub day_base_sold: Decimal,
    /// Feed price after rate offsets.
    pub price: Price,
}

/// One tick's sizing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub id: u64,
    pub bucket_id: i64,
    pub bucket_uuid: String,
    pub now: DateTime<Utc>,
    pub seconds_into_day: i64,
    pub capped_amount: Decimal,
    pub price: Price,
}

/// Advance the pacing state by one tick.
pub fn advance<R: Rng + ?Sized>(
    params: &TwapParams,
    state: &TwapState,
    inputs: &TwapInputs,
    rng: &mut R,
) -> LevelsResult<(TwapState, Round)> {
    let round_id = state.previous_round_id.map_or(0, |id| id + 1);
    let bucket = next_bucket(params, state.bucket.as_ref(), inputs, round_id)?;

    let remaining = bucket.base_remaining();
    let min_order = bucket.min_order_size_base;
    let capped_amount = if remaining <= min_order {
        remaining.max(Decimal::ZERO)
    } else {
        let fraction = Decimal::new(rng.gen_range(0..=DRAW_MAX), DRAW_SCALE);
        min_order + fraction * (remaining - min_order)
    };

    let round = Round {
        id: round_id,
        bucket_id: bucket.id,
        bucket_uuid: bucket.uuid.clone(),
        now: inputs.now,
        seconds_into_day: seconds_into_day(inputs.now),
        capped_amount,
        price: inputs.price,
    };
    let next = TwapState {
        bucket: Some(bucket),
        previous_round_id: Some(round_id),
    };
    Ok((next, round))
}

fn next_bucket(
    params: &TwapParams,
    active: Option<&Bucket>,
    inputs: &TwapInputs,
    round_id: u64,
) -> LevelsResult<Bucket> {
    let size = params.bucket_size_seconds;
    let id = seconds_into_day(inputs.now) / size;
    let start = day_start(inputs.now) + Duration::seconds(id * size);

    let Some(active) = active else {
        return Ok(first_frame(params, inputs, id, start, round_id));
    };

    if active.start == start {
        let mut bucket = active.clone();
        bucket.dynamic = DynamicBucketValues {
            is_new: false,
            round_id,
            day_base_sold: inputs.day_base_sold,
            base_sold: inputs.day_base_sold - bucket.day_base_sold_start,
            now: inputs.now,
        };
        return Ok(bucket);
    }

    let frame = first_frame(params, inputs, id, start, round_id);
    if id == 0 || active.start.date_naive() != start.date_naive() {
        return Ok(frame);
    }
    cutover(params, active, frame)
}

/// Fresh bucket with no surplus carried in.
fn first_frame(
    params: &TwapParams,
    inputs: &TwapInputs,
    id: i64,
    start: DateTime<Utc>,
    round_id: u64,
) -> Bucket {
    let size = params.bucket_size_seconds;
    let total_buckets_to_sell = params.total_buckets_to_sell();
    let base_capacity = inputs.day_base_capacity / Decimal::from(total_buckets_to_sell);
    let mut bucket = Bucket {
        id,
        uuid: String::new(),
        start,
        end: start + Duration::seconds(size) - Duration::nanoseconds(1),
        size_seconds: size,
        total_buckets: params.total_buckets(),
        total_buckets_to_sell,
        day_base_sold_start: inputs.day_base_sold,
        day_base_capacity: inputs.day_base_capacity,
        total_base_surplus_start: Decimal::ZERO,
        base_surplus_included: Decimal::ZERO,
        base_capacity,
        min_order_size_base: params.min_child_fraction * base_capacity,
        dynamic: DynamicBucketValues {
            is_new: true,
            round_id,
            day_base_sold: inputs.day_base_sold,
            base_sold: Decimal::ZERO,
            now: inputs.now,
        },
    };
    bucket.refresh_uuid();
    bucket
}

/// Move into the next bucket of the same day, carrying the surplus forward.
fn cutover(params: &TwapParams, previous: &Bucket, mut bucket: Bucket) -> LevelsResult<Bucket> {
    if bucket.id < previous.id {
        return Err(LevelsError::Bucket(format!(
            "bucket id went backwards from {} to {} on {}",
            previous.id,
            bucket.id,
            bucket.start.date_naive()
        )));
    }
    if bucket.id != previous.id + 1 {
        warn!(
            previous = previous.id,
            next = bucket.id,
            "skipped buckets since last round, redistributing surplus anyway"
        );
    }

    // the queried volume may include fills that landed after the last round
    let day_base_sold = bucket.day_base_sold_start;
    bucket.day_base_sold_start = previous.dynamic.day_base_sold;
    bucket.dynamic.day_base_sold = day_base_sold;
    bucket.dynamic.base_sold = day_base_sold - bucket.day_base_sold_start;

    let average_capacity = bucket.base_capacity;
    let expected_sold = average_capacity * Decimal::from(bucket.id);
    bucket.total_base_surplus_start = expected_sold - bucket.day_base_sold_start;

    let remaining_buckets = bucket.total_buckets - bucket.id;
    let terms = (params.surplus_ceiling * Decimal::from(remaining_buckets)).ceil();
    let terms = terms.to_u64().unwrap_or(0);
    bucket.base_surplus_included =
        first_geometric_term(bucket.total_base_surplus_start, params.smoothing_factor, terms);
    bucket.base_capacity = average_capacity + bucket.base_surplus_included;
    Ok(bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn params() -> TwapParams {
        TwapParams {
            bucket_size_seconds: 3600,
            num_hours_to_sell: 24,
            surplus_ceiling: dec!(0.1),
            smoothing_factor: dec!(0.5),
            min_child_fraction: dec!(0.1),
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn inputs(now: DateTime<Utc>, sold: Decimal) -> TwapInputs {
        TwapInputs {
            now,
            day_base_capacity: dec!(8640),
            day_base_sold: sold,
            price: Price::new(dec!(1.5)),
        }
    }

    #[test]
    fn test_totals() {
        let p = params();
        assert_eq!(p.total_buckets(), 24);
        assert_eq!(p.total_buckets_to_sell(), 24);
        let partial = TwapParams {
            num_hours_to_sell: 5,
            bucket_size_seconds: 7200,
            ..params()
        };
        assert_eq!(partial.total_buckets_to_sell(), 3);
    }

    #[test]
    fn test_first_round_creates_bucket() {
        let mut rng = SmallRng::seed_from_u64(7);
        let (state, round) =
            advance(&params(), &TwapState::default(), &inputs(at(0, 10), dec!(0)), &mut rng)
                .unwrap();
        let bucket = state.bucket.unwrap();
        assert_eq!(round.id, 0);
        assert_eq!(bucket.id, 0);
        assert!(bucket.dynamic.is_new);
        assert_eq!(bucket.base_capacity, dec!(360));
        assert_eq!(bucket.min_order_size_base, dec!(36));
        assert_eq!(bucket.end, at(1, 0) - Duration::nanoseconds(1));
        assert!(round.capped_amount >= dec!(36) && round.capped_amount <= dec!(360));
        assert_eq!(round.price.0, dec!(1.5));
    }

    #[test]
    fn test_same_bucket_tracks_sold() {
        let p = params();
        let mut rng = SmallRng::seed_from_u64(7);
        let (state, _) =
            advance(&p, &TwapState::default(), &inputs(at(3, 0), dec!(100)), &mut rng).unwrap();
        let (state, round) = advance(&p, &state, &inputs(at(3, 5), dec!(400)), &mut rng).unwrap();
        let bucket = state.bucket.as_ref().unwrap();
        assert_eq!(round.id, 1);
        assert!(!bucket.dynamic.is_new);
        assert_eq!(bucket.dynamic.base_sold, dec!(300));
        // 60 left, above the 36 minimum
        assert!(round.capped_amount >= dec!(36) && round.capped_amount <= dec!(60));

        let (_, round) = advance(&p, &state, &inputs(at(3, 9), dec!(440)), &mut rng).unwrap();
        assert_eq!(round.capped_amount, dec!(20));

        let (_, round) = advance(&p, &state, &inputs(at(3, 9), dec!(500)), &mut rng).unwrap();
        assert_eq!(round.capped_amount, Decimal::ZERO);
    }

    #[test]
    fn test_cutover_redistributes_surplus() {
        let p = params();
        let mut rng = SmallRng::seed_from_u64(1);
        let (state, _) =
            advance(&p, &TwapState::default(), &inputs(at(0, 0), dec!(0)), &mut rng).unwrap();
        let (state, round) = advance(&p, &state, &inputs(at(1, 0), dec!(0)), &mut rng).unwrap();
        let bucket = state.bucket.unwrap();
        assert_eq!(bucket.id, 1);
        assert_ne!(round.bucket_uuid, "");
        assert_eq!(bucket.total_base_surplus_start, dec!(360));
        // 23 buckets left, ceil(0.1 * 23) = 3 terms: 360 * 0.5 / 0.875
        assert_eq!(bucket.base_surplus_included.round_dp(4), dec!(205.7143));
        assert_eq!(bucket.base_capacity.round_dp(4), dec!(565.7143));
    }

    #[test]
    fn test_cutover_uses_last_observed_sold_as_baseline() {
        let p = params();
        let mut rng = SmallRng::seed_from_u64(1);
        let (state, _) =
            advance(&p, &TwapState::default(), &inputs(at(0, 0), dec!(0)), &mut rng).unwrap();
        let (state, _) = advance(&p, &state, &inputs(at(0, 50), dec!(300)), &mut rng).unwrap();
        // a late fill of 50 landed after the last round of bucket 0
        let (state, _) = advance(&p, &state, &inputs(at(1, 1), dec!(350)), &mut rng).unwrap();
        let bucket = state.bucket.unwrap();
        assert_eq!(bucket.day_base_sold_start, dec!(300));
        assert_eq!(bucket.dynamic.base_sold, dec!(50));
        assert_eq!(bucket.total_base_surplus_start, dec!(60));
    }

    #[test]
    fn test_new_day_starts_fresh() {
        let p = params();
        let mut rng = SmallRng::seed_from_u64(3);
        let (state, _) =
            advance(&p, &TwapState::default(), &inputs(at(23, 30), dec!(5000)), &mut rng).unwrap();
        let tomorrow = at(23, 30) + Duration::hours(6);
        let (state, round) = advance(&p, &state, &inputs(tomorrow, dec!(0)), &mut rng).unwrap();
        let bucket = state.bucket.unwrap();
        assert_eq!(bucket.id, 5);
        assert_eq!(round.id, 1);
        assert_eq!(bucket.total_base_surplus_start, Decimal::ZERO);
        assert_eq!(bucket.base_capacity, dec!(360));
    }

    #[test]
    fn test_clock_going_backwards_is_an_error() {
        let p = params();
        let mut rng = SmallRng::seed_from_u64(3);
        let (state, _) =
            advance(&p, &TwapState::default(), &inputs(at(5, 0), dec!(0)), &mut rng).unwrap();
        let result = advance(&p, &state, &inputs(at(4, 0), dec!(0)), &mut rng);
        assert!(matches!(result, Err(LevelsError::Bucket(_))));
    }

    #[test]
    fn test_rounds_never_exceed_capacity_plus_min() {
        let p = params();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut state = TwapState::default();
        let mut sold = Decimal::ZERO;
        let mut total = Decimal::ZERO;
        for minute in 0..60 {
            let (next, round) = advance(&p, &state, &inputs(at(7, minute), sold), &mut rng).unwrap();
            // every round fills completely
            sold += round.capped_amount;
            total += round.capped_amount;
            state = next;
        }
        let bucket = state.bucket.unwrap();
        assert!(total <= bucket.base_capacity + bucket.min_order_size_base);
    }

    #[test]
    fn test_seeded_rounds_are_reproducible() {
        let p = params();
        let run = |seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            advance(&p, &TwapState::default(), &inputs(at(2, 0), dec!(0)), &mut rng)
                .unwrap()
                .1
                .capped_amount
        };
        assert_eq!(run(9), run(9));
    }
}
