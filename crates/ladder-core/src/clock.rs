//! Trading-day time utilities.
//!
//! The trading day runs from 00:00:00 UTC to 23:59:59.999999999 UTC.
//! A [`Clock`] is injected wherever the current time drives a decision so
//! that pacing logic can be tested without touching the wall clock.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use parking_lot::Mutex;

/// Number of seconds in one trading day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Midnight UTC of the day containing `dt`.
#[must_use]
pub fn day_start(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Whole seconds elapsed since midnight UTC.
#[must_use]
pub fn seconds_into_day(dt: DateTime<Utc>) -> i64 {
    i64::from(dt.num_seconds_from_midnight())
}

/// Calendar date used to key daily volume queries.
#[must_use]
pub fn trading_date(dt: DateTime<Utc>) -> NaiveDate {
    dt.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap()
    }

    #[test]
    fn test_day_start_truncates_to_midnight() {
        assert_eq!(day_start(utc(2026, 2, 7, 13, 45, 10)), utc(2026, 2, 7, 0, 0, 0));
        assert_eq!(day_start(utc(2026, 2, 7, 0, 0, 0)), utc(2026, 2, 7, 0, 0, 0));
    }

    #[test]
    fn test_seconds_into_day() {
        assert_eq!(seconds_into_day(utc(2026, 2, 7, 0, 0, 0)), 0);
        assert_eq!(seconds_into_day(utc(2026, 2, 7, 1, 0, 1)), 3601);
        assert_eq!(seconds_into_day(utc(2026, 2, 7, 23, 59, 59)), SECONDS_PER_DAY - 1);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(utc(2026, 2, 7, 10, 0, 0));
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), utc(2026, 2, 7, 11, 30, 0));
        clock.set(utc(2026, 2, 8, 0, 0, 0));
        assert_eq!(trading_date(clock.now()), NaiveDate::from_ymd_opt(2026, 2, 8).unwrap());
    }
}
