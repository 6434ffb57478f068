//! Driver configuration (replay and polling)

use crate::config::StrategyConfig;
use crate::data::{Timeframe, DEFAULT_WINDOW_CAPACITY};
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by the replay and polling drivers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Symbol (e.g., "BTC/USDT")
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Candles kept in the window (and fetched per poll)
    pub window_capacity: usize,
    /// Wall-clock cadence of the polling driver
    pub poll_interval: Duration,
    /// Largest tolerated run of missing bars before older history is dropped
    pub max_missing_bars: u32,
    /// Replay starting equity
    pub starting_balance: f64,
    /// Commission per side, as a fraction of notional (e.g. 0.0003)
    pub commission: f64,
}

impl RunnerConfig {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            poll_interval: Duration::from_secs(60),
            max_missing_bars: 1,
            starting_balance: 1000.0,
            commission: 0.0003,
        }
    }

    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_starting_balance(mut self, balance: f64) -> Self {
        self.starting_balance = balance;
        self
    }

    pub fn with_commission(mut self, commission: f64) -> Self {
        self.commission = commission;
        self
    }

    /// Validate against the strategy it will drive
    pub fn validate(&self, strategy: &StrategyConfig) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::ConfigInvalid("symbol cannot be empty".to_string()));
        }
        let warmup = strategy.warmup_len();
        if self.window_capacity < warmup {
            return Err(EngineError::ConfigInvalid(format!(
                "window capacity {} is shorter than the warm-up length {}",
                self.window_capacity, warmup
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(EngineError::ConfigInvalid(
                "poll interval must be > 0".to_string(),
            ));
        }
        if !(self.starting_balance.is_finite() && self.starting_balance > 0.0) {
            return Err(EngineError::ConfigInvalid(format!(
                "starting balance must be > 0 (got {})",
                self.starting_balance
            )));
        }
        if !(0.0..1.0).contains(&self.commission) {
            return Err(EngineError::ConfigInvalid(format!(
                "commission must be in [0, 1) (got {})",
                self.commission
            )));
        }
        Ok(())
    }
}
