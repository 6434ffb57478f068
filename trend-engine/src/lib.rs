//! Trend-Engine: a deterministic signal & risk-management engine
//!
//! Turns a rolling window of OHLCV candles into a directional signal,
//! position-state transitions and stop-loss / take-profit / trailing-stop
//! levels. The same engine core is driven by:
//!
//! - the [`backtest::ReplayDriver`], iterating a fixed historical sequence
//! - the [`live::PollingDriver`], fetching the newest window on a fixed cadence
//!
//! Indicators are computed with [ta-rs](https://github.com/greyblake/ta-rs)
//! where it provides them (EMA, RSI, ATR, SMA, rolling min/max).
//!
//! # Example
//!
//! ```no_run
//! use trend_engine::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let candles: Vec<Candle> = Vec::new();
//!     let runner = RunnerConfig::new("BTC/USDT", Timeframe::H1);
//!     let driver = ReplayDriver::new(StrategyConfig::default(), runner)?;
//!     let report = driver.run(&candles)?;
//!     println!("{}", BacktestReport::new(report.result.clone()).format());
//!     Ok(())
//! }
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod indicators;
pub mod live;
pub mod notify;
pub mod portfolio;
pub mod strategy;

pub use engine::SignalEngine;
pub use error::{EngineError, Result};

// Re-export commonly used types
pub mod prelude {
    pub use crate::backtest::*;
    pub use crate::config::*;
    pub use crate::data::*;
    pub use crate::engine::SignalEngine;
    pub use crate::error::{EngineError, Result};
    pub use crate::exchange::*;
    pub use crate::indicators::IndicatorSnapshot;
    pub use crate::live::*;
    pub use crate::notify::*;
    pub use crate::portfolio::*;
    pub use crate::strategy::*;
}
