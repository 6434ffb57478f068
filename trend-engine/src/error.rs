//! Engine error taxonomy

use thiserror::Error;

/// Errors produced by the engine and its collaborators.
///
/// Only [`EngineError::ConfigInvalid`] is fatal: every other variant
/// degrades the current cycle to `HOLD` inside the drivers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Empty or short window, or a failed market-data fetch
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// An indicator has not seen enough history yet
    #[error("indicator '{0}' is undefined (insufficient warm-up)")]
    IndicatorUndefined(&'static str),

    /// Order placement or position close rejected by the execution sink
    #[error("execution failure: {0}")]
    ExecutionFailure(String),

    /// Bad strategy or runner configuration
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Candle violates the OHLCV invariants or arrives out of order
    #[error("invalid candle: {0}")]
    InvalidCandle(String),
}

impl EngineError {
    /// Whether the error must prevent an engine instance from starting
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::ConfigInvalid(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
