//! Daily traded volume, used for sell caps and TWAP pacing.

use chrono::NaiveDate;
use ladder_core::OrderSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LevelsResult;

/// Volume already traded today, in the seller frame of one side.
///
/// For the sell side `base_sold` is base sold and `quote_cost` the quote
/// received. For the buy side they are quote spent and base received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyVolume {
    pub base_sold: Decimal,
    pub quote_cost: Decimal,
}

/// External store of executed volume, queried by date.
#[cfg_attr(test, mockall::automock)]
pub trait DailyVolumeSource: Send + Sync {
    fn daily_volume(&self, date: NaiveDate, side: OrderSide) -> LevelsResult<DailyVolume>;
}

/// Which asset a daily limit is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapAsset {
    Base,
    Quote,
}

/// Maximum amount one side may sell per UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLimit {
    pub amount: Decimal,
    pub asset: CapAsset,
}

impl DailyLimit {
    /// Sold-so-far in the limit's own denomination.
    #[must_use]
    pub fn sold(&self, volume: &DailyVolume) -> Decimal {
        match self.asset {
            CapAsset::Base => volume.base_sold,
            CapAsset::Quote => volume.quote_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_limit_reads_matching_denomination() {
        let volume = DailyVolume {
            base_sold: dec!(10),
            quote_cost: dec!(25),
        };
        let base = DailyLimit {
            amount: dec!(100),
            asset: CapAsset::Base,
        };
        let quote = DailyLimit {
            asset: CapAsset::Quote,
            ..base
        };
        assert_eq!(base.sold(&volume), dec!(10));
        assert_eq!(quote.sold(&volume), dec!(25));
    }

    #[test]
    fn test_limit_from_toml() {
        let limit: DailyLimit = toml::from_str("amount = \"500\"\nasset = \"quote\"").unwrap();
        assert_eq!(limit.asset, CapAsset::Quote);
        assert_eq!(limit.amount, dec!(500));
    }
}
