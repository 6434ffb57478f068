//! Supertrend direction + stochastic RSI entries

use crate::config::StrategyConfig;
use crate::error::Result;
use crate::indicators::{IndicatorSnapshot, TrendDirection};
use crate::portfolio::PositionSide;
use crate::strategy::{EntryPolicy, EntryVerdict};

/// Long while the Supertrend points up and stochastic RSI is above
/// `rsi_threshold`; short on the mirror. Exits when the direction flips.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupertrendStochPolicy;

impl EntryPolicy for SupertrendStochPolicy {
    fn name(&self) -> &str {
        "supertrend_stoch"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot, config: &StrategyConfig) -> Result<EntryVerdict> {
        let direction = snapshot.require_direction()?;
        let stoch = snapshot.require("stoch_rsi")?;
        Ok(EntryVerdict {
            long: direction == TrendDirection::Up && stoch > config.rsi_threshold,
            short: direction == TrendDirection::Down && stoch < config.rsi_threshold,
        })
    }

    fn trend_reversed(&self, side: PositionSide, snapshot: &IndicatorSnapshot) -> Result<bool> {
        let direction = snapshot.require_direction()?;
        Ok(match side {
            PositionSide::Long => direction == TrendDirection::Down,
            PositionSide::Short => direction == TrendDirection::Up,
        })
    }
}
