//! Data management module
//!
//! Handles OHLCV candles, the bounded candle window fed to the engine and
//! sanitation of collaborator-supplied candle sequences.

pub mod candle;
pub mod sanitize;
pub mod timeframe;
pub mod window;

pub use candle::*;
pub use sanitize::*;
pub use timeframe::*;
pub use window::*;
