//! Entry policy trait and shared filters

use crate::config::StrategyConfig;
use crate::error::Result;
use crate::indicators::IndicatorSnapshot;
use crate::portfolio::PositionSide;

/// Raw entry predicates for one bar.
///
/// Both flags set at once is an inconsistency the state machine resolves
/// to HOLD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryVerdict {
    pub long: bool,
    pub short: bool,
}

impl EntryVerdict {
    pub fn none() -> Self {
        Self::default()
    }

    /// Keep only the directions that also pass `filter`
    pub fn and(self, filter: bool) -> Self {
        Self {
            long: self.long && filter,
            short: self.short && filter,
        }
    }
}

/// Pluggable entry rule set.
///
/// Policies read only the latest snapshot; any undefined value they need
/// surfaces as [`crate::EngineError::IndicatorUndefined`].
pub trait EntryPolicy: Send + Sync {
    /// Get policy name
    fn name(&self) -> &str;

    /// Evaluate the long and short entry predicates
    fn evaluate(&self, snapshot: &IndicatorSnapshot, config: &StrategyConfig) -> Result<EntryVerdict>;

    /// Whether the trend premise of an open `side` position has flipped
    fn trend_reversed(&self, side: PositionSide, snapshot: &IndicatorSnapshot) -> Result<bool>;
}

/// Fast/slow EMA trend combined with the RSI regime
pub fn ema_rsi_verdict(snapshot: &IndicatorSnapshot, config: &StrategyConfig) -> Result<EntryVerdict> {
    let fast = snapshot.require("ema_fast")?;
    let slow = snapshot.require("ema_slow")?;
    let rsi = snapshot.require("rsi")?;
    Ok(EntryVerdict {
        long: fast > slow && rsi > config.rsi_threshold,
        short: fast < slow && rsi < config.rsi_threshold,
    })
}

/// ADX inside the configured band (no trend below, exhaustion above)
pub fn adx_in_band(snapshot: &IndicatorSnapshot, config: &StrategyConfig) -> Result<bool> {
    let adx = snapshot.require("adx")?;
    let (low, high) = config.adx_band;
    Ok(adx >= low && adx <= high)
}

/// Current volume above its moving average
pub fn volume_confirmed(snapshot: &IndicatorSnapshot) -> Result<bool> {
    let volume = snapshot.require("volume")?;
    let average = snapshot.require("volume_sma")?;
    Ok(volume > average)
}

/// Fast EMA crossed against an open position
pub fn ema_reversed(side: PositionSide, snapshot: &IndicatorSnapshot) -> Result<bool> {
    let fast = snapshot.require("ema_fast")?;
    let slow = snapshot.require("ema_slow")?;
    Ok(match side {
        PositionSide::Long => fast < slow,
        PositionSide::Short => fast > slow,
    })
}
