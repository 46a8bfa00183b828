//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] ladder_strategy::StrategyError),

    #[error("Filter error: {0}")]
    Filter(#[from] ladder_filter::FilterError),

    #[error("Trader error: {0}")]
    Trader(#[from] ladder_trader::TraderError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] ladder_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
