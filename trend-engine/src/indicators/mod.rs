//! Technical indicators module
//!
//! Provides technical analysis indicators using the `ta` crate, plus the
//! Wilder-smoothed indicators `ta` does not ship (ADX, Supertrend) and a
//! stochastic RSI built from `ta` primitives.
//!
//! Every indicator reports `None` until it has seen its full lookback; the
//! [`IndicatorSnapshot`] propagates that as an undefined value.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod stoch_rsi;
pub mod supertrend;
mod wilder;

pub use adx::*;
pub use atr::*;
pub use ema::*;
pub use rsi::*;
pub use sma::*;
pub use snapshot::*;
pub use stoch_rsi::*;
pub use supertrend::*;

use crate::data::Candle;
use crate::error::EngineError;

/// Indicator trait for all indicators
pub trait Indicator {
    /// Get the name of the indicator
    fn name(&self) -> &str;

    /// Update indicator with the next candle
    fn update(&mut self, candle: &Candle);

    /// Get current indicator value
    fn value(&self) -> Option<f64>;

    /// Check if indicator is ready (has enough data)
    fn is_ready(&self) -> bool;

    /// Candles needed before the first defined value
    fn lookback(&self) -> usize;
}

pub(crate) fn ta_error(name: &str, period: usize, err: ta::errors::TaError) -> EngineError {
    EngineError::ConfigInvalid(format!("failed to create {}({}): {:?}", name, period, err))
}
