//! Ladder levels and venue precision constraints.

use serde::{Deserialize, Serialize};

use crate::{OrderSide, Price, Size};

/// One rung of a desired ladder. Index 0 of a ladder is the best level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub price: Price,
    pub amount: Size,
}

impl Level {
    pub fn new(price: Price, amount: Size) -> Self {
        Self { price, amount }
    }
}

/// Venue precision and minimum size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConstraints {
    /// Decimal places allowed in prices.
    #[serde(default = "default_precision")]
    pub price_precision: u32,
    /// Decimal places allowed in base amounts.
    #[serde(default = "default_precision")]
    pub volume_precision: u32,
    /// Smallest base amount the venue accepts.
    #[serde(default)]
    pub min_base_volume: Size,
}

fn default_precision() -> u32 {
    7
}

impl Default for OrderConstraints {
    fn default() -> Self {
        Self {
            price_precision: default_precision(),
            volume_precision: default_precision(),
            min_base_volume: Size::ZERO,
        }
    }
}

impl OrderConstraints {
    pub fn new(price_precision: u32, volume_precision: u32, min_base_volume: Size) -> Self {
        Self {
            price_precision,
            volume_precision,
            min_base_volume,
        }
    }

    #[inline]
    pub fn price(&self, price: Price) -> Price {
        price.quantize(self.price_precision)
    }

    #[inline]
    pub fn volume(&self, amount: Size) -> Size {
        amount.quantize(self.volume_precision)
    }

    /// Convert a seller-frame price and amount into quantized pair terms.
    ///
    /// The buy side sells quote: its frame price is base per quote and its
    /// frame amount is in quote units. Returns `None` for a zero frame price.
    pub fn to_pair_terms(
        &self,
        side: OrderSide,
        frame_price: Price,
        frame_amount: Size,
    ) -> Option<(Price, Size)> {
        match side {
            OrderSide::Sell => Some((self.price(frame_price), self.volume(frame_amount))),
            OrderSide::Buy => {
                let price = frame_price.invert()?;
                let amount = Size::new(frame_amount.notional(frame_price));
                Some((self.price(price), self.volume(amount)))
            }
        }
    }
}
