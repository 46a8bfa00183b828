//! Error types for ladder-levels.

use ladder_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelsError {
    #[error("Invalid level provider configuration: {0}")]
    InvalidConfig(String),

    #[error("Price feed error: {0}")]
    Feed(String),

    #[error("Daily volume query failed: {0}")]
    Volume(String),

    #[error("Bucket error: {0}")]
    Bucket(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type LevelsResult<T> = Result<T, LevelsError>;
