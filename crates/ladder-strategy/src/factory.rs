//! Builds strategies by name from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use ladder_core::{AssetPair, Clock, OrderBookSource, OrderConstraints, OrderSide};
use ladder_levels::{
    DailyLimit, DailyVolumeSource, FeedPair, FeedRegistry, LevelProviderKind,
    SellTwapLevelProvider, StaticSpreadLevelProvider, TickerSource,
};
use tracing::info;

use crate::compose::ComposeStrategy;
use crate::config::{BuySellConfig, SellTwapStrategyConfig, StrategyConfig};
use crate::delete_side::DeleteSideStrategy;
use crate::error::{StrategyError, StrategyResult};
use crate::mirror::MirrorStrategy;
use crate::sell_side::SellSideStrategy;
use crate::side::SideStrategyKind;
use crate::strategy::StrategyKind;

/// Names accepted by [`build_strategy`].
pub const STRATEGY_NAMES: [&str; 5] = ["buysell", "sell", "sell_twap", "mirror", "delete"];

/// Shared collaborators handed to every strategy at construction.
///
/// Built once at startup; replaces any process-wide lookup tables.
pub struct StrategyContext {
    pub pair: AssetPair,
    pub constraints: OrderConstraints,
    pub feeds: FeedRegistry,
    pub books: HashMap<String, Arc<dyn OrderBookSource>>,
    pub volume: Arc<dyn DailyVolumeSource>,
    pub clock: Arc<dyn Clock>,
}

impl StrategyContext {
    pub fn new(
        pair: AssetPair,
        constraints: OrderConstraints,
        volume: Arc<dyn DailyVolumeSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pair,
            constraints,
            feeds: FeedRegistry::new(),
            books: HashMap::new(),
            volume,
            clock,
        }
    }

    pub fn register_ticker(&mut self, name: impl Into<String>, source: Arc<dyn TickerSource>) {
        self.feeds.register(name, source);
    }

    pub fn register_book(&mut self, name: impl Into<String>, source: Arc<dyn OrderBookSource>) {
        self.books.insert(name.into(), source);
    }
}

/// Build the strategy named by `config.name`.
pub fn build_strategy(config: &StrategyConfig, ctx: &StrategyContext) -> StrategyResult<StrategyKind> {
    info!(strategy = %config.name, pair = %ctx.pair, "building strategy");
    match config.name.as_str() {
        "buysell" => {
            let section = section(config.buysell.as_ref(), "buysell")?;
            build_buysell(section, ctx)
        }
        "sell" => {
            let section = section(config.sell.as_ref(), "sell")?;
            let sell = static_side(OrderSide::Sell, section, ctx)?;
            Ok(ComposeStrategy::new(delete_side(OrderSide::Buy), sell).into())
        }
        "sell_twap" => {
            let section = section(config.sell_twap.as_ref(), "sell_twap")?;
            let sell = twap_side(section, ctx)?;
            Ok(ComposeStrategy::new(delete_side(OrderSide::Buy), sell).into())
        }
        "mirror" => {
            let section = section(config.mirror.as_ref(), "mirror")?;
            let book = ctx.books.get(&section.source).ok_or_else(|| {
                StrategyError::InvalidConfig(format!(
                    "unknown order book source '{}'",
                    section.source
                ))
            })?;
            let mirror = MirrorStrategy::new(section.clone(), Arc::clone(book), ctx.constraints.clone())?;
            Ok(mirror.into())
        }
        "delete" => Ok(ComposeStrategy::new(
            delete_side(OrderSide::Buy),
            delete_side(OrderSide::Sell),
        )
        .into()),
        other => Err(StrategyError::UnknownStrategy(other.to_string())),
    }
}

fn section<'a, T>(section: Option<&'a T>, name: &str) -> StrategyResult<&'a T> {
    section.ok_or_else(|| StrategyError::InvalidConfig(format!("missing [strategy.{name}] section")))
}

fn delete_side(side: OrderSide) -> SideStrategyKind {
    DeleteSideStrategy::new(side).into()
}

fn build_buysell(config: &BuySellConfig, ctx: &StrategyContext) -> StrategyResult<StrategyKind> {
    let sell = static_side(OrderSide::Sell, config, ctx)?;
    let buy = static_side(OrderSide::Buy, config, ctx)?;
    Ok(ComposeStrategy::new(buy, sell).into())
}

fn static_side(
    side: OrderSide,
    config: &BuySellConfig,
    ctx: &StrategyContext,
) -> StrategyResult<SideStrategyKind> {
    let sell_feed = ctx.feeds.build_pair(&config.feed_a, &config.feed_b)?;
    let (feed, offset, limit, min_price): (FeedPair, _, Option<DailyLimit>, _) = match side {
        OrderSide::Sell => (sell_feed, config.rate_offset, config.max_daily_sell, config.min_price),
        OrderSide::Buy => (
            sell_feed.inverted(),
            config.rate_offset.inverted(),
            config.max_daily_buy,
            None,
        ),
    };

    let mut provider = StaticSpreadLevelProvider::new(
        side,
        config.levels.clone(),
        config.amount_of_a_base,
        feed,
        ctx.constraints.clone(),
    )?
    .with_offset(offset)
    .with_min_price(min_price);
    if let Some(limit) = limit {
        provider = provider.with_daily_limit(limit, Arc::clone(&ctx.volume), Arc::clone(&ctx.clock));
    }

    Ok(SellSideStrategy::new(
        side,
        &ctx.pair,
        LevelProviderKind::from(provider),
        ctx.constraints.clone(),
        config.price_tolerance,
        config.amount_tolerance,
    )
    .into())
}

fn twap_side(config: &SellTwapStrategyConfig, ctx: &StrategyContext) -> StrategyResult<SideStrategyKind> {
    let feed = ctx.feeds.build_pair(&config.feed_a, &config.feed_b)?;
    let provider = SellTwapLevelProvider::new(
        &config.twap,
        feed,
        Arc::clone(&ctx.volume),
        Arc::clone(&ctx.clock),
        ctx.constraints.clone(),
    )?;
    Ok(SellSideStrategy::new(
        OrderSide::Sell,
        &ctx.pair,
        LevelProviderKind::from(provider),
        ctx.constraints.clone(),
        config.price_tolerance,
        config.amount_tolerance,
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use ladder_core::{ManualClock, OrderBook};
    use ladder_levels::{DailyVolume, LevelsResult};

    struct NoVolume;

    impl DailyVolumeSource for NoVolume {
        fn daily_volume(&self, _date: NaiveDate, _side: OrderSide) -> LevelsResult<DailyVolume> {
            Ok(DailyVolume::default())
        }
    }

    struct EmptyBook;

    impl OrderBookSource for EmptyBook {
        fn order_book(&self, _depth: usize) -> ladder_core::Result<OrderBook> {
            Ok(OrderBook::default())
        }
    }

    fn ctx() -> StrategyContext {
        let mut ctx = StrategyContext::new(
            AssetPair::new("XLM", "USD"),
            OrderConstraints::default(),
            Arc::new(NoVolume),
            Arc::new(ManualClock::new(Utc::now())),
        );
        ctx.register_book("ext", Arc::new(EmptyBook));
        ctx
    }

    fn config(toml_str: &str) -> StrategyConfig {
        toml::from_str(toml_str).unwrap()
    }

    const BUYSELL: &str = r#"
name = "buysell"
[buysell]
amount_of_a_base = "10"
max_daily_buy = { amount = "50", asset = "quote" }
levels = [{ spread = "0.01", amount = "1" }]
"#;

    #[test]
    fn test_builds_every_named_strategy() {
        assert!(matches!(
            build_strategy(&config(BUYSELL), &ctx()).unwrap(),
            StrategyKind::Compose(_)
        ));
        let sell = BUYSELL.replace("buysell", "sell");
        assert!(build_strategy(&config(&sell), &ctx()).is_ok());

        let twap = r#"
name = "sell_twap"
[sell_twap]
num_hours_to_sell = 12
parent_bucket_size_seconds = 600
day_base_capacity = "1000"
"#;
        assert!(build_strategy(&config(twap), &ctx()).is_ok());

        let mirror = "name = \"mirror\"\n[mirror]\nsource = \"ext\"";
        assert!(matches!(
            build_strategy(&config(mirror), &ctx()).unwrap(),
            StrategyKind::Mirror(_)
        ));

        assert!(build_strategy(&config("name = \"delete\""), &ctx()).is_ok());
    }

    #[test]
    fn test_unknown_name_and_missing_section() {
        assert!(matches!(
            build_strategy(&config("name = \"grid\""), &ctx()),
            Err(StrategyError::UnknownStrategy(_))
        ));
        assert!(matches!(
            build_strategy(&config("name = \"mirror\""), &ctx()),
            Err(StrategyError::InvalidConfig(_))
        ));
        let bad_source = "name = \"mirror\"\n[mirror]\nsource = \"nope\"";
        assert!(build_strategy(&config(bad_source), &ctx()).is_err());
    }

    #[test]
    fn test_invalid_twap_config_fails_fast() {
        let twap = r#"
name = "sell_twap"
[sell_twap]
num_hours_to_sell = 12
parent_bucket_size_seconds = 7000
day_base_capacity = "1000"
"#;
        assert!(matches!(
            build_strategy(&config(twap), &ctx()),
            Err(StrategyError::Levels(_))
        ));
    }

    #[test]
    fn test_names_are_all_buildable_or_need_sections() {
        for name in STRATEGY_NAMES {
            let result = build_strategy(&config(&format!("name = \"{name}\"")), &ctx());
            if name == "delete" {
                assert!(result.is_ok());
            } else {
                assert!(matches!(result, Err(StrategyError::InvalidConfig(_))));
            }
        }
    }
}
