//! Risk management
//!
//! Stop-loss and take-profit are placed in ATR units from the entry price.
//! The trailing stop is recomputed from the close on every bar but only
//! ever moves in the position's favor.

use crate::config::StrategyConfig;
use crate::data::Candle;
use crate::portfolio::{Position, PositionSide};
use crate::strategy::ExitReason;

/// Risk manager
#[derive(Debug, Clone)]
pub struct RiskManager {
    atr_mult_sl: f64,
    atr_mult_tp: f64,
    trailing_mult: f64,
    trailing: bool,
}

/// A stop-loss or take-profit crossing and its fill price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitTrigger {
    pub reason: ExitReason,
    pub price: f64,
}

impl RiskManager {
    /// Create new risk manager
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            atr_mult_sl: config.atr_mult_sl,
            atr_mult_tp: config.atr_mult_tp,
            trailing_mult: config.trailing_mult,
            trailing: config.trailing_enabled(),
        }
    }

    /// Whether trailing-stop updates are active
    pub fn trailing(&self) -> bool {
        self.trailing
    }

    /// Initial (stop_loss, take_profit) for an entry at `entry_price`
    pub fn initial_levels(&self, side: PositionSide, entry_price: f64, atr: f64) -> (f64, f64) {
        let sign = side.sign();
        let stop_loss = entry_price - sign * self.atr_mult_sl * atr;
        let take_profit = entry_price + sign * self.atr_mult_tp * atr;
        (stop_loss, take_profit)
    }

    /// Trailing stop after a bar closing at `price`.
    ///
    /// Returns the current stop unchanged when the candidate would loosen it
    /// or when trailing is disabled.
    pub fn trail(&self, position: &Position, price: f64, atr: f64) -> f64 {
        if !self.trailing {
            return position.stop_loss;
        }
        let candidate = price - position.side.sign() * self.trailing_mult * atr;
        match position.side {
            PositionSide::Long => position.stop_loss.max(candidate),
            PositionSide::Short => position.stop_loss.min(candidate),
        }
    }

    /// Detect a stop-loss or take-profit crossing within `candle`'s range.
    ///
    /// The fill is the crossed level, or the open when the bar gapped
    /// through it. When both levels are inside one bar the stop wins.
    pub fn check_exit(&self, position: &Position, candle: &Candle) -> Option<ExitTrigger> {
        let (sl, tp) = (position.stop_loss, position.take_profit);
        let (stop_hit, target_hit) = match position.side {
            PositionSide::Long => (candle.low <= sl, candle.high >= tp),
            PositionSide::Short => (candle.high >= sl, candle.low <= tp),
        };

        if stop_hit {
            let gapped = match position.side {
                PositionSide::Long => candle.open < sl,
                PositionSide::Short => candle.open > sl,
            };
            return Some(ExitTrigger {
                reason: ExitReason::StopLoss,
                price: if gapped { candle.open } else { sl },
            });
        }

        if target_hit {
            let gapped = match position.side {
                PositionSide::Long => candle.open > tp,
                PositionSide::Short => candle.open < tp,
            };
            return Some(ExitTrigger {
                reason: ExitReason::TakeProfit,
                price: if gapped { candle.open } else { tp },
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn long_at_100() -> Position {
        Position::new(PositionSide::Long, 100.0, 96.0, 105.2, 1.0, Utc::now())
    }

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(open, high, low, close, 1.0, Utc::now())
    }

    #[test]
    fn test_initial_levels() {
        let risk = RiskManager::new(&StrategyConfig::default());
        let (sl, tp) = risk.initial_levels(PositionSide::Long, 100.0, 2.0);
        assert!((sl - 96.0).abs() < 1e-9);
        assert!((tp - 105.2).abs() < 1e-9);

        let (sl, tp) = risk.initial_levels(PositionSide::Short, 100.0, 2.0);
        assert!((sl - 104.0).abs() < 1e-9);
        assert!((tp - 94.8).abs() < 1e-9);
    }

    #[test]
    fn test_trailing_never_loosens() {
        let risk = RiskManager::new(&StrategyConfig::default());
        let mut pos = long_at_100();

        pos.stop_loss = risk.trail(&pos, 104.0, 2.0);
        assert!((pos.stop_loss - 101.0).abs() < 1e-9);

        // price falls back: candidate 96.0 would loosen
        assert_eq!(risk.trail(&pos, 99.0, 2.0), 101.0);

        let mut short = Position::new(PositionSide::Short, 100.0, 104.0, 94.8, 1.0, Utc::now());
        short.stop_loss = risk.trail(&short, 97.0, 2.0);
        assert!((short.stop_loss - 100.0).abs() < 1e-9);
        assert_eq!(risk.trail(&short, 103.0, 2.0), 100.0);
    }

    #[test]
    fn test_fixed_stops_without_trailing() {
        let risk = RiskManager::new(&StrategyConfig::adx_volume());
        assert!(!risk.trailing());
        assert_eq!(risk.trail(&long_at_100(), 120.0, 2.0), 96.0);
    }

    #[test]
    fn test_exit_fill_prices() {
        let risk = RiskManager::new(&StrategyConfig::default());
        let pos = long_at_100();

        assert!(risk.check_exit(&pos, &bar(100.0, 101.0, 99.0, 100.5)).is_none());

        let hit = risk.check_exit(&pos, &bar(99.0, 99.5, 95.0, 97.0)).unwrap();
        assert_eq!(hit.reason, ExitReason::StopLoss);
        assert_eq!(hit.price, 96.0);

        let gap = risk.check_exit(&pos, &bar(94.0, 95.0, 93.0, 94.5)).unwrap();
        assert_eq!(gap.price, 94.0);

        let tp = risk.check_exit(&pos, &bar(104.0, 106.0, 103.0, 105.0)).unwrap();
        assert_eq!(tp.reason, ExitReason::TakeProfit);
        assert_eq!(tp.price, 105.2);

        // both crossed: the stop wins
        let both = risk.check_exit(&pos, &bar(100.0, 106.0, 95.0, 100.0)).unwrap();
        assert_eq!(both.reason, ExitReason::StopLoss);
    }
}
