//! Hard price limits per side.

use ladder_core::{Offer, Operation, OrderSide, Price};
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::merge::{filter_ops, Verdict};
use crate::pipeline::SubmitFilter;

/// `[filters.price_band]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBandConfig {
    /// Sells below this are never placed.
    #[serde(default)]
    pub min_price: Option<Price>,
    /// Buys above this are never placed.
    #[serde(default)]
    pub max_price: Option<Price>,
}

#[derive(Debug, Clone, Copy)]
pub struct PriceBandFilter {
    config: PriceBandConfig,
}

impl PriceBandFilter {
    pub fn new(config: PriceBandConfig) -> FilterResult<Self> {
        if config.min_price.is_none() && config.max_price.is_none() {
            return Err(FilterError::ConfigError(
                "price_band needs min_price or max_price".to_string(),
            ));
        }
        Ok(Self { config })
    }

    fn allows(&self, side: OrderSide, price: Price) -> bool {
        match side {
            OrderSide::Sell => self.config.min_price.map_or(true, |min| price >= min),
            OrderSide::Buy => self.config.max_price.map_or(true, |max| price <= max),
        }
    }
}

impl SubmitFilter for PriceBandFilter {
    fn name(&self) -> &'static str {
        "price_band"
    }

    fn apply(
        &self,
        ops: &[Operation],
        sell_offers: &[Offer],
        buy_offers: &[Offer],
    ) -> FilterResult<Vec<Operation>> {
        filter_ops(self.name(), ops, sell_offers, buy_offers, |op| {
            Ok(match op.price() {
                Some(price) if !self.allows(op.side(), price) => Verdict::Drop,
                _ => Verdict::Keep(op.clone()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_core::Size;
    use rust_decimal_macros::dec;

    #[test]
    fn test_band_from_toml() {
        let config: PriceBandConfig = toml::from_str("min_price = \"0.5\"").unwrap();
        assert_eq!(config.min_price, Some(Price::new(dec!(0.5))));
        assert!(config.max_price.is_none());
        assert!(PriceBandFilter::new(PriceBandConfig::default()).is_err());
    }

    #[test]
    fn test_limits_each_side() {
        let filter = PriceBandFilter::new(PriceBandConfig {
            min_price: Some(Price::new(dec!(1.0))),
            max_price: Some(Price::new(dec!(0.9))),
        })
        .unwrap();
        let sells = vec![
            Offer::new(1, OrderSide::Sell, Price::new(dec!(0.95)), Size::new(dec!(1))),
            Offer::new(2, OrderSide::Sell, Price::new(dec!(1.0)), Size::new(dec!(1))),
        ];
        let buys = vec![
            Offer::new(3, OrderSide::Buy, Price::new(dec!(0.92)), Size::new(dec!(1))),
            Offer::new(4, OrderSide::Buy, Price::new(dec!(0.9)), Size::new(dec!(1))),
        ];
        let out = filter.apply(&[], &sells, &buys).unwrap();
        assert_eq!(out, vec![buys[0].cancel(), sells[0].cancel()]);
    }
}
