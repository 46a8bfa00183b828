//! Ladder market maker application.
//!
//! Loads the TOML [`AppConfig`], builds the strategy, filters and venue it
//! names, and drives them through the [`Application`] update loop.

pub mod app;
pub mod config;
pub mod error;
pub mod sim;

pub use app::{shutdown_on_ctrl_c, Application, PAPER_SOURCE};
pub use config::{AppConfig, SimConfig};
pub use error::{AppError, AppResult};
pub use sim::MarketSim;
