//! EMA cross + RSI regime entries

use crate::config::StrategyConfig;
use crate::error::Result;
use crate::indicators::IndicatorSnapshot;
use crate::portfolio::PositionSide;
use crate::strategy::{adx_in_band, ema_reversed, ema_rsi_verdict, volume_confirmed, EntryPolicy, EntryVerdict};

/// Baseline policy: `ema_fast > ema_slow && rsi > threshold` for longs,
/// mirrored for shorts. ADX band and volume filters apply only when their
/// lengths are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselinePolicy;

impl EntryPolicy for BaselinePolicy {
    fn name(&self) -> &str {
        "baseline"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot, config: &StrategyConfig) -> Result<EntryVerdict> {
        let mut verdict = ema_rsi_verdict(snapshot, config)?;
        if config.adx_len.is_some() {
            verdict = verdict.and(adx_in_band(snapshot, config)?);
        }
        if config.volume_sma_len.is_some() {
            verdict = verdict.and(volume_confirmed(snapshot)?);
        }
        Ok(verdict)
    }

    fn trend_reversed(&self, side: PositionSide, snapshot: &IndicatorSnapshot) -> Result<bool> {
        ema_reversed(side, snapshot)
    }
}
