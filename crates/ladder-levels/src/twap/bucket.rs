//! TWAP buckets: fixed slices of the trading day with their own capacity.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Values refreshed on every round inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicBucketValues {
    pub is_new: bool,
    pub round_id: u64,
    pub day_base_sold: Decimal,
    pub base_sold: Decimal,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Zero-based index of this bucket within the day.
    pub id: i64,
    pub uuid: String,
    pub start: DateTime<Utc>,
    /// Inclusive; one nanosecond before the next bucket starts.
    pub end: DateTime<Utc>,
    pub size_seconds: i64,
    pub total_buckets: i64,
    pub total_buckets_to_sell: i64,
    pub day_base_sold_start: Decimal,
    pub day_base_capacity: Decimal,
    pub total_base_surplus_start: Decimal,
    pub base_surplus_included: Decimal,
    pub base_capacity: Decimal,
    pub min_order_size_base: Decimal,
    pub dynamic: DynamicBucketValues,
}

impl Bucket {
    #[must_use]
    pub fn day_base_remaining(&self) -> Decimal {
        self.day_base_capacity - self.dynamic.day_base_sold
    }

    #[must_use]
    pub fn base_remaining(&self) -> Decimal {
        self.base_capacity - self.dynamic.base_sold
    }

    /// Recompute `uuid` after any of its inputs changed.
    pub(crate) fn refresh_uuid(&mut self) {
        self.uuid = bucket_uuid(
            self.start,
            self.end,
            self.total_buckets,
            self.total_buckets_to_sell,
            self.min_order_size_base,
        );
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bucket[uuid={}, date={}, id={}, start={}, end={}, total_buckets={}, total_buckets_to_sell={}, \
             day_base_sold_start={}, day_base_capacity={}, total_base_surplus_start={}, \
             base_surplus_included={}, base_capacity={}, min_order_size_base={}, is_new={}, round_id={}, \
             day_base_sold={}, day_base_remaining={}, base_sold={}, base_remaining={}]",
            self.uuid,
            self.start.date_naive(),
            self.id,
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.total_buckets,
            self.total_buckets_to_sell,
            self.day_base_sold_start,
            self.day_base_capacity,
            self.total_base_surplus_start,
            self.base_surplus_included,
            self.base_capacity,
            self.min_order_size_base,
            self.dynamic.is_new,
            self.dynamic.round_id,
            self.dynamic.day_base_sold,
            self.day_base_remaining(),
            self.dynamic.base_sold,
            self.base_remaining(),
        )
    }
}

/// Stable identifier for a bucket's time interval and sizing config.
///
/// Any process that derives the same interval with the same config gets the
/// same id, so restarts mid-bucket can be correlated in logs.
#[must_use]
pub fn bucket_uuid(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    total_buckets: i64,
    total_buckets_to_sell: i64,
    min_order_size_base: Decimal,
) -> String {
    let mut min_order = min_order_size_base.round_dp(8);
    min_order.rescale(8);
    let key = format!(
        "timePartition=startTime={}_endTime={}__configPartition=totalBuckets={}_totalBucketsToSell={}_minOrderSizeBase={}",
        start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        end.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        total_buckets,
        total_buckets_to_sell,
        min_order,
    );
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// `base^exp` for a non-negative integer exponent, exact in decimal.
fn pow_u64(base: Decimal, mut exp: u64) -> Decimal {
    let mut result = Decimal::ONE;
    let mut factor = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result *= factor;
        }
        exp >>= 1;
        if exp > 0 {
            factor *= factor;
        }
    }
    result
}

/// First term `a` of a geometric series with sum `total`, ratio `ratio` and
/// `terms` terms: `a = Sn (r - 1) / (r^n - 1)`.
///
/// Early buckets absorb the largest share of a surplus; a ratio of one spreads
/// it evenly.
#[must_use]
pub fn first_geometric_term(total: Decimal, ratio: Decimal, terms: u64) -> Decimal {
    if terms == 0 {
        return Decimal::ZERO;
    }
    let denominator = pow_u64(ratio, terms) - Decimal::ONE;
    if ratio == Decimal::ONE || denominator.is_zero() {
        return total / Decimal::from(terms);
    }
    total * (ratio - Decimal::ONE) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    #[test]
    fn test_geometric_first_term() {
        let a = first_geometric_term(dec!(8000), dec!(0.5), 4);
        assert_eq!(a.round_dp(2), dec!(4266.67));
    }

    #[test]
    fn test_geometric_edge_cases() {
        assert_eq!(first_geometric_term(dec!(100), dec!(1), 4), dec!(25));
        assert_eq!(first_geometric_term(dec!(100), dec!(0.5), 0), Decimal::ZERO);
        // ratio 0 puts everything in the first term
        assert_eq!(first_geometric_term(dec!(100), dec!(0), 3), dec!(100));
        // negative surplus (oversold) is redistributed the same way
        assert_eq!(
            first_geometric_term(dec!(-8000), dec!(0.5), 4).round_dp(2),
            dec!(-4266.67)
        );
    }

    #[test]
    fn test_pow() {
        assert_eq!(pow_u64(dec!(0.5), 4), dec!(0.0625));
        assert_eq!(pow_u64(dec!(3), 0), Decimal::ONE);
        assert_eq!(pow_u64(dec!(2), 10), dec!(1024));
    }

    #[test]
    fn test_uuid_stability() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap();
        let end = start + Duration::seconds(3600) - Duration::nanoseconds(1);

        let a = bucket_uuid(start, end, 24, 24, dec!(36));
        let b = bucket_uuid(start, end, 24, 24, dec!(36.000000000));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        assert_ne!(a, bucket_uuid(start + Duration::seconds(1), end, 24, 24, dec!(36)));
        assert_ne!(a, bucket_uuid(start, end + Duration::seconds(1), 24, 24, dec!(36)));
        assert_ne!(a, bucket_uuid(start, end, 48, 24, dec!(36)));
        assert_ne!(a, bucket_uuid(start, end, 24, 12, dec!(36)));
        assert_ne!(a, bucket_uuid(start, end, 24, 24, dec!(36.00000001)));
    }
}
