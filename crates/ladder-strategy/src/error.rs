//! Error types for ladder-strategy.

use ladder_core::CoreError;
use ladder_levels::LevelsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Invalid strategy configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("Invalid level at index {index}: {reason}")]
    InvalidLevel { index: usize, reason: String },

    #[error("errors on both sides: buying (= {buying}) and selling (= {selling})")]
    BothSides {
        buying: Box<StrategyError>,
        selling: Box<StrategyError>,
    },

    #[error("error in {side} sub-strategy: {source}")]
    SubStrategy {
        side: &'static str,
        #[source]
        source: Box<StrategyError>,
    },

    #[error(transparent)]
    Levels(#[from] LevelsError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StrategyError {
    pub(crate) fn buying(source: StrategyError) -> Self {
        Self::SubStrategy {
            side: "buying",
            source: Box::new(source),
        }
    }

    pub(crate) fn selling(source: StrategyError) -> Self {
        Self::SubStrategy {
            side: "selling",
            source: Box::new(source),
        }
    }

    /// Merge the outcome of running both sides.
    pub(crate) fn combine<A, B>(
        buy: StrategyResult<A>,
        sell: StrategyResult<B>,
    ) -> StrategyResult<(A, B)> {
        match (buy, sell) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            (Err(e1), Err(e2)) => Err(Self::BothSides {
                buying: Box::new(e1),
                selling: Box::new(e2),
            }),
            (Err(e), Ok(_)) => Err(Self::buying(e)),
            (Ok(_), Err(e)) => Err(Self::selling(e)),
        }
    }
}

pub type StrategyResult<T> = Result<T, StrategyError>;
