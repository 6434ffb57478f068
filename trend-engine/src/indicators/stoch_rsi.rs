//! Stochastic RSI oscillator

use crate::data::Candle;
use crate::error::Result;
use crate::indicators::{ta_error, Indicator, RSI};
use ta::indicators::{Maximum, Minimum};
use ta::Next;

/// Position of the current RSI within its `period`-bar range, 0–100
#[derive(Debug)]
pub struct StochRSI {
    rsi: RSI,
    max: Maximum,
    min: Minimum,
    period: usize,
    rsi_count: usize,
    last_value: Option<f64>,
}

impl StochRSI {
    /// Create new StochRSI indicator
    pub fn new(period: usize) -> Result<Self> {
        Ok(Self {
            rsi: RSI::new(period)?,
            max: Maximum::new(period).map_err(|e| ta_error("StochRSI", period, e))?,
            min: Minimum::new(period).map_err(|e| ta_error("StochRSI", period, e))?,
            period,
            rsi_count: 0,
            last_value: None,
        })
    }
}

impl Indicator for StochRSI {
    fn name(&self) -> &str {
        "StochRSI"
    }

    fn update(&mut self, candle: &Candle) {
        self.rsi.update(candle);
        // only defined RSI values enter the range
        let Some(rsi) = self.rsi.value() else {
            return;
        };
        let highest = self.max.next(rsi);
        let lowest = self.min.next(rsi);
        self.rsi_count += 1;
        if self.rsi_count >= self.period {
            let span = highest - lowest;
            self.last_value = Some(if span > 0.0 {
                100.0 * (rsi - lowest) / span
            } else {
                50.0
            });
        }
    }

    fn value(&self) -> Option<f64> {
        self.last_value
    }

    fn is_ready(&self) -> bool {
        self.last_value.is_some()
    }

    fn lookback(&self) -> usize {
        2 * self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_bounded_after_lookback() {
        let mut stoch = StochRSI::new(4).unwrap();
        let base = Utc::now();
        let closes = [100.0, 102.0, 101.0, 103.0, 99.0, 98.0, 104.0, 105.0, 101.0, 100.0];
        for (i, c) in closes.iter().enumerate() {
            stoch.update(&Candle::new(*c, c + 1.0, c - 1.0, *c, 1.0, base + Duration::hours(i as i64)));
            if i + 1 < stoch.lookback() {
                assert!(stoch.value().is_none());
            }
        }
        let v = stoch.value().unwrap();
        assert!((0.0..=100.0).contains(&v));
    }
}
