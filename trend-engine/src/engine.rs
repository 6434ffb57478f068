//! Engine core shared by the replay and polling drivers
//!
//! [`SignalEngine::evaluate`] recomputes the indicator snapshot over the
//! whole window (O(window length) per call) and feeds the latest candle to
//! the state machine. It performs no I/O and never reads the clock, so the
//! same candle sequence yields the same decisions in every driver.

use crate::config::StrategyConfig;
use crate::data::CandleWindow;
use crate::error::{EngineError, Result};
use crate::indicators::IndicatorSnapshot;
use crate::portfolio::{Position, PositionState};
use crate::strategy::{Decision, EntryPolicy, SignalStateMachine};
use tracing::debug;

/// Indicator pipeline + state machine + risk manager
#[derive(Debug)]
pub struct SignalEngine {
    machine: SignalStateMachine,
    warmup: usize,
}

impl SignalEngine {
    /// Create new engine; fails with [`EngineError::ConfigInvalid`]
    pub fn new(config: StrategyConfig) -> Result<Self> {
        let warmup = config.warmup_len();
        Ok(Self {
            machine: SignalStateMachine::new(config)?,
            warmup,
        })
    }

    /// Create an engine with a custom entry policy
    pub fn with_policy(config: StrategyConfig, policy: Box<dyn EntryPolicy>) -> Result<Self> {
        let warmup = config.warmup_len();
        Ok(Self {
            machine: SignalStateMachine::with_policy(config, policy)?,
            warmup,
        })
    }

    /// Decide on the latest candle of `window`.
    ///
    /// An empty window is [`EngineError::DataUnavailable`]; a window shorter
    /// than the warm-up length always yields HOLD.
    pub fn evaluate(&mut self, window: &CandleWindow) -> Result<Decision> {
        let candle = window
            .latest()
            .ok_or_else(|| EngineError::DataUnavailable("empty candle window".to_string()))?;

        if window.len() < self.warmup {
            debug!("Warming up: {}/{} candles", window.len(), self.warmup);
            return Ok(Decision::hold(
                candle.close,
                candle.timestamp,
                format!("warming up ({}/{})", window.len(), self.warmup),
            ));
        }

        let snapshot = IndicatorSnapshot::compute(window, self.machine.config())?;
        debug!(
            "{} close={:.4} ema_fast={:?} ema_slow={:?} rsi={:?} atr={:?}",
            candle.timestamp, candle.close, snapshot.ema_fast, snapshot.ema_slow, snapshot.rsi, snapshot.atr
        );
        Ok(self.machine.step(&snapshot, candle))
    }

    pub fn position(&self) -> &PositionState {
        self.machine.state()
    }

    /// Drop the open position after the broker reported it closed
    pub fn force_flat(&mut self) -> Option<Position> {
        self.machine.force_flat()
    }

    pub fn config(&self) -> &StrategyConfig {
        self.machine.config()
    }

    /// Candles needed before any non-HOLD decision
    pub fn warmup_len(&self) -> usize {
        self.warmup
    }

    pub fn policy_name(&self) -> &str {
        self.machine.policy_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Candle;
    use crate::strategy::Action;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_empty_window_is_data_unavailable() {
        let mut engine = SignalEngine::new(StrategyConfig::default()).unwrap();
        let window = CandleWindow::new(50).unwrap();
        assert!(matches!(
            engine.evaluate(&window),
            Err(EngineError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = StrategyConfig {
            ema_fast_len: 0,
            ..StrategyConfig::default()
        };
        assert!(SignalEngine::new(config).unwrap_err().is_fatal());
    }

    #[test]
    fn test_warmup_holds_on_strong_trend() {
        let mut engine = SignalEngine::new(StrategyConfig::default()).unwrap();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut window = CandleWindow::new(100).unwrap();
        let mut actions = Vec::new();
        for i in 0..30 {
            let c = 100.0 + i as f64 * 2.0;
            window
                .append(Candle::new(c - 1.0, c + 1.0, c - 1.5, c, 10.0, base + Duration::hours(i)))
                .unwrap();
            actions.push(engine.evaluate(&window).unwrap().action);
        }
        let warmup = engine.warmup_len();
        assert!(actions[..warmup - 1].iter().all(|a| *a == Action::Hold));
        assert_eq!(actions[warmup - 1], Action::EnterLong);
    }
}
