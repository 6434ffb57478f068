//! RSI (Relative Strength Index) indicator
//!
//! Average gain and average loss are Wilder-smoothed (alpha = 1/period),
//! each seeded with the mean of the first `period` close-to-close changes.

use crate::data::Candle;
use crate::error::{EngineError, Result};
use crate::indicators::wilder::Wilder;
use crate::indicators::Indicator;

/// RSI indicator over closing prices, bounded 0–100
#[derive(Debug, Clone)]
pub struct RSI {
    period: usize,
    prev_close: Option<f64>,
    gain: Wilder,
    loss: Wilder,
    last_value: Option<f64>,
}

impl RSI {
    /// Create new RSI indicator
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(EngineError::ConfigInvalid(
                "RSI period must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            period,
            prev_close: None,
            gain: Wilder::new(period),
            loss: Wilder::new(period),
            last_value: None,
        })
    }

    /// Feed a raw value instead of a candle close
    pub fn update_value(&mut self, value: f64) {
        let Some(prev) = self.prev_close.replace(value) else {
            return;
        };
        let change = value - prev;
        let avg_gain = self.gain.next(change.max(0.0));
        let avg_loss = self.loss.next((-change).max(0.0));
        if let (Some(avg_gain), Some(avg_loss)) = (avg_gain, avg_loss) {
            self.last_value = Some(rsi_from_averages(avg_gain, avg_loss));
        }
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // flat series sits at the midpoint
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

impl Indicator for RSI {
    fn name(&self) -> &str {
        "RSI"
    }

    fn update(&mut self, candle: &Candle) {
        self.update_value(candle.close);
    }

    fn value(&self) -> Option<f64> {
        self.last_value
    }

    fn is_ready(&self) -> bool {
        self.last_value.is_some()
    }

    fn lookback(&self) -> usize {
        self.period + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_readiness_and_bounds() {
        let mut rsi = RSI::new(14).unwrap();
        for i in 0..14 {
            rsi.update_value(100.0 + i as f64);
        }
        // needs period changes, so period+1 values
        assert!(!rsi.is_ready());
        assert!(rsi.value().is_none());

        rsi.update_value(101.0);
        assert!(rsi.is_ready());
        let v = rsi.value().unwrap();
        assert!((0.0..=100.0).contains(&v));
    }

    #[test]
    fn test_rising_prices_are_bullish() {
        let mut rsi = RSI::new(5).unwrap();
        for i in 0..20 {
            rsi.update_value(100.0 + i as f64 * 0.5);
        }
        assert_eq!(rsi.value(), Some(100.0));
    }

    #[test]
    fn test_wilder_smoothing_by_hand() {
        // changes: +2, -1, +1 seed gain 1.0, loss 1/3
        // next change -2: gain = (1.0*2 + 0)/3 = 2/3, loss = (1/3*2 + 2)/3 = 8/9
        let mut rsi = RSI::new(3).unwrap();
        for close in [10.0, 12.0, 11.0, 12.0] {
            rsi.update_value(close);
        }
        assert!((rsi.value().unwrap() - 75.0).abs() < 1e-9);

        rsi.update_value(10.0);
        let expected = 100.0 - 100.0 / (1.0 + (2.0 / 3.0) / (8.0 / 9.0));
        assert!((rsi.value().unwrap() - expected).abs() < 1e-9);
        assert!((expected - 42.857142857142854).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series_is_neutral() {
        let mut rsi = RSI::new(4).unwrap();
        for _ in 0..10 {
            rsi.update_value(100.0);
        }
        assert_eq!(rsi.value(), Some(50.0));
    }
}
