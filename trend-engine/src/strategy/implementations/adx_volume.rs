//! EMA + RSI entries confirmed by trend strength and volume

use crate::config::StrategyConfig;
use crate::error::Result;
use crate::indicators::IndicatorSnapshot;
use crate::portfolio::PositionSide;
use crate::strategy::{adx_in_band, ema_reversed, ema_rsi_verdict, volume_confirmed, EntryPolicy, EntryVerdict};

/// Baseline predicate that also requires ADX inside `adx_band` and volume
/// above its average. Stops stay where they were placed at entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdxVolumePolicy;

impl EntryPolicy for AdxVolumePolicy {
    fn name(&self) -> &str {
        "adx_volume"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot, config: &StrategyConfig) -> Result<EntryVerdict> {
        let verdict = ema_rsi_verdict(snapshot, config)?;
        Ok(verdict
            .and(adx_in_band(snapshot, config)?)
            .and(volume_confirmed(snapshot)?))
    }

    fn trend_reversed(&self, side: PositionSide, snapshot: &IndicatorSnapshot) -> Result<bool> {
        ema_reversed(side, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_both_filters() {
        let config = StrategyConfig::adx_volume();
        let mut snap = IndicatorSnapshot {
            ema_fast: Some(101.0),
            ema_slow: Some(100.0),
            rsi: Some(60.0),
            adx: Some(25.0),
            volume: Some(150.0),
            volume_sma: Some(100.0),
            ..Default::default()
        };
        assert!(AdxVolumePolicy.evaluate(&snap, &config).unwrap().long);

        snap.volume = Some(90.0);
        assert!(!AdxVolumePolicy.evaluate(&snap, &config).unwrap().long);

        snap.volume = Some(150.0);
        snap.adx = Some(10.0);
        assert!(!AdxVolumePolicy.evaluate(&snap, &config).unwrap().long);

        snap.adx = None;
        assert!(AdxVolumePolicy.evaluate(&snap, &config).is_err());
    }
}
