//! Prometheus metrics for the ladder bot.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_int_gauge_vec, CounterVec,
    Encoder, Gauge, Histogram, IntGaugeVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Update loop outcomes.
/// Labels: result (success/failure)
pub static UPDATE_LOOP_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_update_loop_total",
        "Completed update loop iterations by result",
        &["result"]
    )
    .unwrap()
});

/// Operations produced per phase.
/// Labels: phase (prune/update/submit), kind (create/modify/delete)
pub static OPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_ops_total",
        "Operations produced by phase and kind",
        &["phase", "kind"]
    )
    .unwrap()
});

/// Wall time of one tick in seconds.
pub static TICK_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "ladder_tick_duration_seconds",
        "Duration of one update loop tick",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap()
});

/// Submit filter results.
/// Labels: filter, subject (ops/sell_offers/buy_offers), outcome
pub static FILTER_OUTCOME_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_filter_outcome_total",
        "Submit filter outcomes by filter, input list and outcome",
        &["filter", "subject", "outcome"]
    )
    .unwrap()
});

/// Live offers per side after the last snapshot.
pub static LIVE_OFFERS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!("ladder_live_offers", "Resting offers per side", &["side"]).unwrap()
});

/// Cancel-all recoveries after a failed tick.
pub static RECOVERY_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_recovery_total",
        "Cancel-all recoveries by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Base capacity of the active TWAP bucket.
pub static TWAP_BUCKET_CAPACITY: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "ladder_twap_bucket_capacity",
        "Base capacity of the active TWAP bucket"
    )
    .unwrap()
});

/// Base sold in the active TWAP bucket.
pub static TWAP_BUCKET_SOLD: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("ladder_twap_bucket_sold", "Base sold in the active TWAP bucket").unwrap()
});

/// Index of the active TWAP bucket within the day.
pub static TWAP_BUCKET_ID: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("ladder_twap_bucket_id", "Index of the active TWAP bucket").unwrap()
});

/// Fills observed by the fill tracker.
/// Labels: side
pub static FILLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("ladder_fills_total", "Fills observed", &["side"]).unwrap()
});

/// Metrics helper for recording values.
pub struct Metrics;

impl Metrics {
    /// Record the result of one update loop.
    pub fn update_loop(success: bool) {
        let result = if success { "success" } else { "failure" };
        UPDATE_LOOP_TOTAL.with_label_values(&[result]).inc();
    }

    /// Add operations produced in a phase.
    pub fn ops(phase: &str, kind: &str, count: usize) {
        if count > 0 {
            OPS_TOTAL
                .with_label_values(&[phase, kind])
                .inc_by(count as f64);
        }
    }

    pub fn tick_duration(seconds: f64) {
        TICK_DURATION_SECONDS.observe(seconds);
    }

    /// Add filter outcome counts.
    pub fn filter_outcome(filter: &str, subject: &str, outcome: &str, count: u64) {
        if count > 0 {
            FILTER_OUTCOME_TOTAL
                .with_label_values(&[filter, subject, outcome])
                .inc_by(count as f64);
        }
    }

    pub fn live_offers(side: &str, count: usize) {
        LIVE_OFFERS
            .with_label_values(&[side])
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn recovery(success: bool) {
        let outcome = if success { "success" } else { "failure" };
        RECOVERY_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Update the active TWAP bucket gauges.
    pub fn twap_bucket(id: i64, capacity: f64, sold: f64) {
        TWAP_BUCKET_ID.set(id as f64);
        TWAP_BUCKET_CAPACITY.set(capacity);
        TWAP_BUCKET_SOLD.set(sold);
    }

    pub fn fill(side: &str) {
        FILLS_TOTAL.with_label_values(&[side]).inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
