//! ADX (Average Directional Index) indicator
//!
//! `ta` has no ADX, so this follows Wilder's definition directly: smoothed
//! true range and directional movement give DI+/DI-, their normalized
//! spread gives DX, and ADX is DX smoothed once more. Both smoothings are
//! seeded with a simple mean, so the first value needs `2 * period` candles.

use crate::data::Candle;
use crate::error::{EngineError, Result};
use crate::indicators::wilder::Wilder;
use crate::indicators::Indicator;

/// ADX trend-strength indicator, bounded 0–100
#[derive(Debug, Clone)]
pub struct ADX {
    period: usize,
    prev: Option<(f64, f64, f64)>,
    tr: Wilder,
    plus_dm: Wilder,
    minus_dm: Wilder,
    adx: Wilder,
    update_count: usize,
    last_value: Option<f64>,
}

impl ADX {
    /// Create new ADX indicator
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(EngineError::ConfigInvalid(
                "ADX period must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            period,
            prev: None,
            tr: Wilder::new(period),
            plus_dm: Wilder::new(period),
            minus_dm: Wilder::new(period),
            adx: Wilder::new(period),
            update_count: 0,
            last_value: None,
        })
    }
}

impl Indicator for ADX {
    fn name(&self) -> &str {
        "ADX"
    }

    fn update(&mut self, candle: &Candle) {
        self.update_count += 1;
        let (high, low, close) = (candle.high, candle.low, candle.close);
        let Some((prev_high, prev_low, prev_close)) = self.prev.replace((high, low, close)) else {
            return;
        };

        let up_move = high - prev_high;
        let down_move = prev_low - low;
        let plus = if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 };
        let minus = if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 };
        let true_range = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());

        let smoothed = (
            self.tr.next(true_range),
            self.plus_dm.next(plus),
            self.minus_dm.next(minus),
        );
        let (Some(tr), Some(plus), Some(minus)) = smoothed else {
            return;
        };

        let dx = if tr > 0.0 {
            let plus_di = 100.0 * plus / tr;
            let minus_di = 100.0 * minus / tr;
            let di_sum = plus_di + minus_di;
            if di_sum > 0.0 {
                100.0 * (plus_di - minus_di).abs() / di_sum
            } else {
                0.0
            }
        } else {
            0.0
        };

        if let Some(adx) = self.adx.next(dx) {
            self.last_value = Some(adx);
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
