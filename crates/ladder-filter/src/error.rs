//! Filter error types.

use ladder_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Filter {filter} failed: {reason}")]
    Transform { filter: &'static str, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type FilterResult<T> = Result<T, FilterError>;
