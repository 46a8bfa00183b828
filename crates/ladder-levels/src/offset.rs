//! Rate offsets applied to a centre price before spreads.

use ladder_core::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Additive and multiplicative adjustment of a price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateOffset {
    /// Fractional adjustment, 0.01 = +1%.
    #[serde(default)]
    pub percent: Decimal,
    /// Absolute adjustment in quote units.
    #[serde(default)]
    pub absolute: Decimal,
    /// Apply `percent` before `absolute`.
    #[serde(default)]
    pub percent_first: bool,
    /// Work on the reciprocal price (mirrored buy side).
    #[serde(default)]
    pub invert: bool,
}

impl RateOffset {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.percent.is_zero() && self.absolute.is_zero()
    }

    /// Same offset expressed for the opposite frame.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            invert: !self.invert,
            ..*self
        }
    }

    /// Returns the adjusted price and whether anything changed.
    pub fn apply(&self, price: Price) -> (Price, bool) {
        if self.is_zero() || price.is_zero() {
            return (price, false);
        }

        let mut center = price.inner();
        if self.invert {
            center = Decimal::ONE / center;
        }
        let scale = Decimal::ONE + self.percent;
        center = if self.percent_first {
            center * scale + self.absolute
        } else {
            (center + self.absolute) * scale
        };
        if self.invert {
            if center.is_zero() {
                return (price, false);
            }
            center = Decimal::ONE / center;
        }
        (Price::new(center), true)
    }
}
