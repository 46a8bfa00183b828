//! Precision-safe decimal types for trading.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors when comparing ladders against live
//! orders.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// Round to `dp` decimal places, halves away from zero.
#[inline]
pub fn quantize(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Price in quote units per unit of base.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with sizes in calculations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round to the venue's price precision.
    #[inline]
    pub fn quantize(&self, dp: u32) -> Self {
        Self(quantize(self.0, dp))
    }

    /// Reciprocal price (base per quote). `None` for a zero price.
    #[inline]
    pub fn invert(&self) -> Option<Self> {
        if self.0.is_zero() {
            return None;
        }
        Some(Self(Decimal::ONE / self.0))
    }

    /// True when `other` lies within `self ± self * tolerance`.
    #[inline]
    pub fn within_band(&self, other: Price, tolerance: Decimal) -> bool {
        let delta = self.0 * tolerance;
        other.0 >= self.0 - delta && other.0 <= self.0 + delta
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Amount in units of the asset being sold.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round to the venue's volume precision.
    #[inline]
    pub fn quantize(&self, dp: u32) -> Self {
        Self(quantize(self.0, dp))
    }

    /// Same band test as [`Price::within_band`].
    #[inline]
    pub fn within_band(&self, other: Size, tolerance: Decimal) -> bool {
        let delta = self.0 * tolerance;
        other.0 >= self.0 - delta && other.0 <= self.0 + delta
    }

    /// Calculate notional value: size * price.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Size {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Size {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantize_rounds_half_away_from_zero() {
        assert_eq!(Price::new(dec!(1.23456785)).quantize(7).0, dec!(1.2345679));
        assert_eq!(Size::new(dec!(0.125)).quantize(2).0, dec!(0.13));
        assert_eq!(Size::new(dec!(10)).quantize(2).0, dec!(10));
    }

    #[test]
    fn test_price_invert() {
        assert_eq!(Price::new(dec!(4)).invert(), Some(Price::new(dec!(0.25))));
        assert_eq!(Price::ZERO.invert(), None);
    }

    #[test]
    fn test_within_band_is_inclusive() {
        let level = Price::new(dec!(1.00));
        assert!(level.within_band(Price::new(dec!(1.005)), dec!(0.01)));
        assert!(level.within_band(Price::new(dec!(1.01)), dec!(0.01)));
        assert!(level.within_band(Price::new(dec!(0.99)), dec!(0.01)));
        assert!(!level.within_band(Price::new(dec!(1.0101)), dec!(0.01)));

        let amount = Size::new(dec!(100));
        assert!(amount.within_band(Size::new(dec!(99)), dec!(0.01)));
        assert!(!amount.within_band(Size::new(dec!(98.9)), dec!(0.01)));
    }

    #[test]
    fn test_notional_calculation() {
        let size = Size::new(dec!(0.5));
        let price = Price::new(dec!(50000));

        assert_eq!(size.notional(price), dec!(25000));
    }
}
