//! Trader error types.

use ladder_core::CoreError;
use ladder_filter::FilterError;
use ladder_strategy::StrategyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraderError {
    #[error("Venue error: {0}")]
    Venue(String),

    #[error("Rejected by venue: {0}")]
    Rejected(String),

    #[error("Venue request timed out: {0}")]
    Timeout(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type TraderResult<T> = Result<T, TraderError>;
