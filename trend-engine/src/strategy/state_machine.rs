//! FLAT / LONG / SHORT transitions
//!
//! One call to [`SignalStateMachine::step`] per new candle. From FLAT the
//! entry policy is consulted; in a position the order is: hard exit on the
//! previous stop/target, soft exit on trend reversal, then trailing-stop
//! update.

use crate::config::StrategyConfig;
use crate::data::Candle;
use crate::error::Result;
use crate::indicators::IndicatorSnapshot;
use crate::portfolio::{Position, PositionSide, PositionState, RiskManager};
use crate::strategy::{policy_for, Decision, DecisionValidator, EntryPolicy, ExitReason};
use tracing::{debug, info, warn};

/// Signal state machine paired with its risk manager
pub struct SignalStateMachine {
    config: StrategyConfig,
    policy: Box<dyn EntryPolicy>,
    risk: RiskManager,
    state: PositionState,
}

impl SignalStateMachine {
    /// Create a state machine using the policy of `config.variant`
    pub fn new(config: StrategyConfig) -> Result<Self> {
        let policy = policy_for(config.variant);
        Self::with_policy(config, policy)
    }

    /// Create a state machine with a custom entry policy
    pub fn with_policy(config: StrategyConfig, policy: Box<dyn EntryPolicy>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            risk: RiskManager::new(&config),
            config,
            policy,
            state: PositionState::Flat,
        })
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Drop the open position without emitting a decision
    pub fn force_flat(&mut self) -> Option<Position> {
        match std::mem::take(&mut self.state) {
            PositionState::Flat => None,
            PositionState::Open(position) => Some(position),
        }
    }

    /// Process one candle and its snapshot
    pub fn step(&mut self, snapshot: &IndicatorSnapshot, candle: &Candle) -> Decision {
        match self.state.clone() {
            PositionState::Flat => self.step_flat(snapshot, candle),
            PositionState::Open(position) => self.step_open(position, snapshot, candle),
        }
    }

    fn step_flat(&mut self, snapshot: &IndicatorSnapshot, candle: &Candle) -> Decision {
        let hold = |reason: String| Decision::hold(candle.close, candle.timestamp, reason);

        let verdict = match self.policy.evaluate(snapshot, &self.config) {
            Ok(verdict) => verdict,
            Err(e) => {
                debug!("Entry not evaluated: {}", e);
                return hold(e.to_string());
            }
        };

        let side = match (verdict.long, verdict.short) {
            (true, true) => {
                warn!(
                    "Inconsistent entry at {}: long and short predicates both true, holding",
                    candle.timestamp
                );
                return hold("conflicting entry predicates".to_string());
            }
            (true, false) => PositionSide::Long,
            (false, true) if self.config.allow_short => PositionSide::Short,
            (false, true) => return hold("short entries disabled".to_string()),
            (false, false) => return hold("no entry signal".to_string()),
        };

        let atr = match snapshot.require("atr") {
            Ok(atr) => atr,
            Err(e) => return hold(e.to_string()),
        };

        let price = candle.close;
        let size = self.config.order_size;
        let (stop_loss, take_profit) = self.risk.initial_levels(side, price, atr);
        let decision = Decision::enter(
            side,
            price,
            size,
            candle.timestamp,
            format!("{} {} signal (atr={:.4})", self.policy.name(), side, atr),
        )
        .with_stop_loss(stop_loss)
        .with_take_profit(take_profit);

        if !DecisionValidator::validate(&decision) {
            warn!("Rejected malformed entry: {:?}", decision);
            return hold("malformed entry levels".to_string());
        }

        info!(
            "{} at {:.4}: sl={:.4} tp={:.4} size={}",
            decision.action, price, stop_loss, take_profit, size
        );
        self.state = PositionState::Open(Position::new(
            side,
            price,
            stop_loss,
            take_profit,
            size,
            candle.timestamp,
        ));
        decision
    }

    fn step_open(&mut self, mut position: Position, snapshot: &IndicatorSnapshot, candle: &Candle) -> Decision {
        let side = position.side;

        if let Some(trigger) = self.risk.check_exit(&position, candle) {
            info!("EXIT {} on {} at {:.4}", side, trigger.reason, trigger.price);
            self.state = PositionState::Flat;
            return Decision::exit(side, trigger.price, position.size, trigger.reason, candle.timestamp);
        }

        match self.policy.trend_reversed(side, snapshot) {
            Ok(true) => {
                info!("EXIT {} on trend reversal at {:.4}", side, candle.close);
                self.state = PositionState::Flat;
                return Decision::exit(
                    side,
                    candle.close,
                    position.size,
                    ExitReason::TrendReversal,
                    candle.timestamp,
                );
            }
            Ok(false) => {}
            Err(e) => debug!("Reversal not evaluated: {}", e),
        }

        if self.risk.trailing() {
            if let Some(atr) = snapshot.atr {
                let stop = self.risk.trail(&position, candle.close, atr);
                if stop != position.stop_loss {
                    debug!("Trailing stop {:.4} -> {:.4}", position.stop_loss, stop);
                    position.stop_loss = stop;
                }
            }
        }

        let decision = Decision::hold(candle.close, candle.timestamp, format!("in {} position", side))
            .with_side(side)
            .with_stop_loss(position.stop_loss)
            .with_take_profit(position.take_profit);
        self.state = PositionState::Open(position);
        decision
    }
}

impl std::fmt::Debug for SignalStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalStateMachine")
            .field("policy", &self.policy.name())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{Action, EntryVerdict};
    use chrono::{Duration, TimeZone, Utc};

    fn candle(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Candle::new(open, high, low, close, 1.0, base + Duration::hours(i))
    }

    fn bullish() -> IndicatorSnapshot {
        IndicatorSnapshot {
            close: Some(100.0),
            ema_fast: Some(101.0),
            ema_slow: Some(100.0),
            rsi: Some(60.0),
            atr: Some(2.0),
            ..Default::default()
        }
    }

    struct Both;

    impl EntryPolicy for Both {
        fn name(&self) -> &str {
            "both"
        }

        fn evaluate(&self, _: &IndicatorSnapshot, _: &StrategyConfig) -> Result<EntryVerdict> {
            Ok(EntryVerdict { long: true, short: true })
        }

        fn trend_reversed(&self, _: PositionSide, _: &IndicatorSnapshot) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_conflicting_predicates_hold() {
        let mut sm = SignalStateMachine::with_policy(StrategyConfig::default(), Box::new(Both)).unwrap();
        let d = sm.step(&bullish(), &candle(0, 100.0, 101.0, 99.0, 100.0));
        assert_eq!(d.action, Action::Hold);
        assert!(sm.state().is_flat());
    }

    #[test]
    fn test_enter_then_hold_then_stop() {
        let mut sm = SignalStateMachine::new(StrategyConfig::default()).unwrap();
        let d = sm.step(&bullish(), &candle(0, 100.0, 101.0, 99.0, 100.0));
        assert_eq!(d.action, Action::EnterLong);

        // still bullish: no second entry, stop trails up
        let mut snap = bullish();
        snap.ema_fast = Some(102.0);
        let d = sm.step(&snap, &candle(1, 100.0, 104.5, 99.5, 104.0));
        assert_eq!(d.action, Action::Hold);
        assert!((d.stop_loss.unwrap() - 101.0).abs() < 1e-9);

        let d = sm.step(&snap, &candle(2, 103.0, 103.5, 100.0, 100.5));
        assert_eq!(d.action, Action::Exit);
        assert_eq!(d.exit_reason, Some(ExitReason::StopLoss));
        assert!((d.price - 101.0).abs() < 1e-9);
        assert!(sm.state().is_flat());
    }

    #[test]
    fn test_trend_reversal_exit() {
        let mut sm = SignalStateMachine::new(StrategyConfig::default()).unwrap();
        sm.step(&bullish(), &candle(0, 100.0, 101.0, 99.0, 100.0));

        let mut snap = bullish();
        snap.ema_fast = Some(99.0);
        let d = sm.step(&snap, &candle(1, 100.0, 100.5, 99.0, 99.5));
        assert_eq!(d.action, Action::Exit);
        assert_eq!(d.exit_reason, Some(ExitReason::TrendReversal));
        assert_eq!(d.price, 99.5);
    }

    #[test]
    fn test_short_disabled() {
        let config = StrategyConfig {
            allow_short: false,
            ..StrategyConfig::default()
        };
        let mut sm = SignalStateMachine::new(config).unwrap();
        let snap = IndicatorSnapshot {
            ema_fast: Some(99.0),
            ema_slow: Some(100.0),
            rsi: Some(40.0),
            atr: Some(2.0),
            ..Default::default()
        };
        let d = sm.step(&snap, &candle(0, 100.0, 101.0, 99.0, 100.0));
        assert!(d.is_hold());
    }

    #[test]
    fn test_force_flat() {
        let mut sm = SignalStateMachine::new(StrategyConfig::default()).unwrap();
        sm.step(&bullish(), &candle(0, 100.0, 101.0, 99.0, 100.0));
        let dropped = sm.force_flat().unwrap();
        assert_eq!(dropped.side, PositionSide::Long);
        assert!(sm.state().is_flat());
    }
}
