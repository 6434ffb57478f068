//! Supertrend trend-direction overlay

use crate::data::Candle;
use crate::error::{EngineError, Result};
use crate::indicators::{Indicator, ATR};
use serde::Serialize;

/// Supertrend direction: +1 up, -1 down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    pub fn as_f64(&self) -> f64 {
        match self {
            TrendDirection::Up => 1.0,
            TrendDirection::Down => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bands {
    upper: f64,
    lower: f64,
    direction: TrendDirection,
}

/// Supertrend: ATR bands around the median price that only ratchet
/// toward price, flipping direction when the close breaks through.
#[derive(Debug)]
pub struct Supertrend {
    atr: ATR,
    multiplier: f64,
    prev_close: Option<f64>,
    bands: Option<Bands>,
}

impl Supertrend {
    /// Create new Supertrend indicator
    pub fn new(period: usize, multiplier: f64) -> Result<Self> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(EngineError::ConfigInvalid(format!(
                "supertrend multiplier must be > 0 (got {})",
                multiplier
            )));
        }
        Ok(Self {
            atr: ATR::new(period)?,
            multiplier,
            prev_close: None,
            bands: None,
        })
    }

    /// Current direction, once defined
    pub fn direction(&self) -> Option<TrendDirection> {
        self.bands.map(|b| b.direction)
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        "Supertrend"
    }

    fn update(&mut self, candle: &Candle) {
        self.atr.update(candle);
        let prev_close = self.prev_close.replace(candle.close);
        let Some(atr) = self.atr.value() else {
            return;
        };

        let mid = candle.median_price();
        let basic_upper = mid + self.multiplier * atr;
        let basic_lower = mid - self.multiplier * atr;

        let next = match (self.bands, prev_close) {
            (Some(prev), Some(prev_close)) => {
                let upper = if basic_upper < prev.upper || prev_close > prev.upper {
                    basic_upper
                } else {
                    prev.upper
                };
                let lower = if basic_lower > prev.lower || prev_close < prev.lower {
                    basic_lower
                } else {
                    prev.lower
                };
                let direction = match prev.direction {
                    TrendDirection::Up if candle.close < lower => TrendDirection::Down,
                    TrendDirection::Down if candle.close > upper => TrendDirection::Up,
                    d => d,
                };
                Bands { upper, lower, direction }
            }
            _ => Bands {
                upper: basic_upper,
                lower: basic_lower,
                direction: if candle.close < basic_lower {
                    TrendDirection::Down
                } else {
                    TrendDirection::Up
                },
            },
        };
        self.bands = Some(next);
    }

    /// Active band: lower while trending up, upper while trending down
    fn value(&self) -> Option<f64> {
        self.bands.map(|b| match b.direction {
            TrendDirection::Up => b.lower,
            TrendDirection::Down => b.upper,
        })
    }

    fn is_ready(&self) -> bool {
        self.bands.is_some()
    }

    fn lookback(&self) -> usize {
        self.atr.lookback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn candle(i: i64, close: f64) -> Candle {
        Candle::new(close, close + 1.0, close - 1.0, close, 1.0, Utc::now() + Duration::hours(i))
    }

    #[test]
    fn test_flips_down_on_crash() {
        let mut st = Supertrend::new(3, 1.0).unwrap();
        for i in 0..10 {
            st.update(&candle(i, 100.0 + i as f64));
        }
        assert_eq!(st.direction(), Some(TrendDirection::Up));
        let line = st.value().unwrap();
        assert!(line < 109.0);

        st.update(&candle(10, 80.0));
        assert_eq!(st.direction(), Some(TrendDirection::Down));
    }

    #[test]
    fn test_undefined_during_warmup() {
        let mut st = Supertrend::new(3, 2.0).unwrap();
        for i in 0..3 {
            st.update(&candle(i, 100.0));
        }
        assert!(st.value().is_none());
        st.update(&candle(3, 100.0));
        assert!(st.is_ready());
    }
}
