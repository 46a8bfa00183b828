//! Ordered chain of submit filters.

use std::collections::HashMap;
use std::sync::Arc;

use ladder_core::{LiveOrders, Offer, Operation, OrderBookSource, OrderConstraints};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constraints::OrderConstraintsFilter;
use crate::error::{FilterError, FilterResult};
use crate::maker_mode::{MakerModeConfig, MakerModeFilter};
use crate::price_band::{PriceBandConfig, PriceBandFilter};

/// Last check on operations before they are submitted.
///
/// `sell_offers` are sorted ascending and `buy_offers` descending by price,
/// both in pair terms. Implementations must keep the relative order of the
/// operations they pass through.
pub trait SubmitFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        ops: &[Operation],
        sell_offers: &[Offer],
        buy_offers: &[Offer],
    ) -> FilterResult<Vec<Operation>>;
}

/// `[filters]` section; every entry is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub maker_mode: Option<MakerModeConfig>,
    #[serde(default)]
    pub price_band: Option<PriceBandConfig>,
}

/// Runs configured filters in order, then [`OrderConstraintsFilter`].
pub struct FilterPipeline {
    filters: Vec<Box<dyn SubmitFilter>>,
}

impl FilterPipeline {
    pub fn new(constraints: OrderConstraints) -> Self {
        Self::with_filters(Vec::new(), constraints)
    }

    pub fn with_filters(mut filters: Vec<Box<dyn SubmitFilter>>, constraints: OrderConstraints) -> Self {
        filters.push(Box::new(OrderConstraintsFilter::new(constraints)));
        Self { filters }
    }

    /// Build from config, resolving book sources by name.
    pub fn from_config(
        config: &FilterConfig,
        constraints: OrderConstraints,
        books: &HashMap<String, Arc<dyn OrderBookSource>>,
    ) -> FilterResult<Self> {
        let mut filters: Vec<Box<dyn SubmitFilter>> = Vec::new();
        if let Some(maker) = &config.maker_mode {
            let book = books.get(&maker.source).ok_or_else(|| {
                FilterError::ConfigError(format!("unknown order book source '{}'", maker.source))
            })?;
            filters.push(Box::new(MakerModeFilter::new(Arc::clone(book))));
        }
        if let Some(band) = config.price_band {
            filters.push(Box::new(PriceBandFilter::new(band)?));
        }
        Ok(Self::with_filters(filters, constraints))
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Feed `ops` through every filter against the same live orders.
    pub fn apply(&self, ops: Vec<Operation>, live: &LiveOrders) -> FilterResult<Vec<Operation>> {
        let mut ops = ops;
        for filter in &self.filters {
            let before = ops.len();
            ops = filter.apply(&ops, &live.sell, &live.buy)?;
            debug!(filter = filter.name(), before, after = ops.len(), "applied submit filter");
        }
        Ok(ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_core::{OrderSide, Price, Size};
    use rust_decimal_macros::dec;

    /// Drops everything and records that it ran.
    struct DropAll;

    impl SubmitFilter for DropAll {
        fn name(&self) -> &'static str {
            "drop_all"
        }

        fn apply(
            &self,
            ops: &[Operation],
            sell_offers: &[Offer],
            buy_offers: &[Offer],
        ) -> FilterResult<Vec<Operation>> {
            crate::filter_ops(self.name(), ops, sell_offers, buy_offers, |_| Ok(crate::Verdict::Drop))
        }
    }

    #[test]
    fn test_constraints_filter_is_last() {
        let pipeline = FilterPipeline::with_filters(vec![Box::new(DropAll)], OrderConstraints::default());
        assert_eq!(pipeline.names(), vec!["drop_all", "order_constraints"]);
    }

    #[test]
    fn test_from_config() {
        let config: FilterConfig = toml::from_str(
            "[maker_mode]\nsource = \"venue\"\n\n[price_band]\nmin_price = \"0.1\"",
        )
        .unwrap();
        assert!(FilterPipeline::from_config(&config, OrderConstraints::default(), &HashMap::new()).is_err());

        let only_band = FilterConfig {
            maker_mode: None,
            ..config
        };
        let pipeline =
            FilterPipeline::from_config(&only_band, OrderConstraints::default(), &HashMap::new()).unwrap();
        assert_eq!(pipeline.names(), vec!["price_band", "order_constraints"]);
    }

    #[test]
    fn test_later_filters_see_earlier_deletes() {
        let live = LiveOrders::new(
            vec![Offer::new(1, OrderSide::Sell, Price::new(dec!(1.2)), Size::new(dec!(3)))],
            vec![],
        );
        let ops = vec![Operation::Create {
            side: OrderSide::Sell,
            price: Price::new(dec!(1.1)),
            amount: Size::new(dec!(2)),
        }];
        let pipeline = FilterPipeline::with_filters(vec![Box::new(DropAll)], OrderConstraints::default());
        let out = pipeline.apply(ops, &live).unwrap();
        // the offer is deleted once; the constraints filter passes the delete through
        assert_eq!(out, vec![live.sell[0].cancel()]);
    }
}
