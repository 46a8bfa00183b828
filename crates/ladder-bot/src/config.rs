//! Application configuration.

use crate::error::{AppError, AppResult};
use ladder_core::{AssetPair, OrderConstraints};
use ladder_filter::FilterConfig;
use ladder_strategy::{StrategyConfig, STRATEGY_NAMES};
use ladder_trader::{PaperConfig, TraderConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Random-walk market simulator driving the paper venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Delay between reference price moves (ms). Default: 1,000.
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    /// Largest relative move per step. Default: 0.002 (0.2%).
    #[serde(default = "default_volatility")]
    pub volatility: Decimal,
    /// Fixed seed for a reproducible walk.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_step_ms() -> u64 {
    1_000
}

fn default_volatility() -> Decimal {
    Decimal::new(2, 3)
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            step_ms: default_step_ms(),
            volatility: default_volatility(),
            seed: None,
        }
    }
}

impl SimConfig {
    #[must_use]
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub pair: AssetPair,
    #[serde(default)]
    pub constraints: OrderConstraints,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub trader: TraderConfig,
    /// The paper venue's account and synthetic market.
    pub paper: PaperConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that cannot be expressed in the serde schema.
    pub fn validate(&self) -> AppResult<()> {
        if self.pair.base.is_empty() || self.pair.quote.is_empty() {
            return Err(AppError::Config("pair base and quote must be set".to_string()));
        }
        if self.pair.base == self.pair.quote {
            return Err(AppError::Config(format!(
                "pair base and quote must differ, got {}",
                self.pair
            )));
        }
        if !STRATEGY_NAMES.contains(&self.strategy.name.as_str()) {
            return Err(AppError::Config(format!(
                "unknown strategy '{}', expected one of {:?}",
                self.strategy.name, STRATEGY_NAMES
            )));
        }
        if self.trader.tick_interval_ms == 0 || self.trader.fill_poll_interval_ms == 0 {
            return Err(AppError::Config(
                "trader intervals must be positive".to_string(),
            ));
        }
        if self.trader.fixed_iterations == Some(0) {
            return Err(AppError::Config(
                "fixed_iterations must be positive when set".to_string(),
            ));
        }
        if self.sim.step_ms == 0 {
            return Err(AppError::Config("sim step_ms must be positive".to_string()));
        }
        if self.sim.volatility < Decimal::ZERO || self.sim.volatility >= Decimal::ONE {
            return Err(AppError::Config(format!(
                "sim volatility must be within [0, 1), got {}",
                self.sim.volatility
            )));
        }
        Ok(())
    }
}
