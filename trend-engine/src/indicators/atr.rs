//! ATR (Average True Range) indicator

use crate::data::Candle;
use crate::error::{EngineError, Result};
use crate::indicators::wilder::Wilder;
use crate::indicators::Indicator;
use ta::indicators::TrueRange;
use ta::Next;

/// ATR indicator, in price units.
///
/// True range comes from `ta`; the average is Wilder's (alpha = 1/period)
/// seeded with the mean of the first `period` true ranges. The first candle
/// has no previous close, so its range is skipped.
#[derive(Debug, Clone)]
pub struct ATR {
    period: usize,
    true_range: TrueRange,
    smoother: Wilder,
    update_count: usize,
    last_value: Option<f64>,
}

impl ATR {
    /// Create new ATR indicator
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(EngineError::ConfigInvalid(
                "ATR period must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            period,
            true_range: TrueRange::new(),
            smoother: Wilder::new(period),
            update_count: 0,
            last_value: None,
        })
    }
}

impl Indicator for ATR {
    fn name(&self) -> &str {
        "ATR"
    }

    fn update(&mut self, candle: &Candle) {
        let tr = self.true_range.next(candle);
        self.update_count += 1;
        if self.update_count > 1 {
            self.last_value = self.smoother.next(tr);
        }
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
    use chrono::{Duration, TimeZone, Utc};

    fn bar(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Candle::new(open, high, low, close, 1.0, base + Duration::hours(i))
    }

    #[test]
    fn test_constant_range() {
        let mut atr = ATR::new(3).unwrap();
        for i in 0..10 {
            atr.update(&bar(i, 100.0, 101.0, 99.0, 100.0));
        }
        assert!(atr.is_ready());
        assert!((atr.value().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_wilder_average_by_hand() {
        let mut atr = ATR::new(3).unwrap();
        atr.update(&bar(0, 100.0, 101.0, 99.0, 100.0));
        // true ranges 2, 2, 2 seed the average at 2
        for i in 1..4 {
            atr.update(&bar(i, 100.0, 101.0, 99.0, 100.0));
        }
        assert!((atr.value().unwrap() - 2.0).abs() < 1e-9);

        // wide bar: true range 10, Wilder gives (2*2 + 10)/3
        atr.update(&bar(4, 100.0, 105.0, 95.0, 100.0));
        assert!((atr.value().unwrap() - 14.0 / 3.0).abs() < 1e-9);

        // gap up: true range reaches back to the previous close, 110 - 100
        atr.update(&bar(5, 108.0, 110.0, 107.0, 109.0));
        let expected = (14.0 / 3.0 * 2.0 + 10.0) / 3.0;
        assert!((atr.value().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_undefined_until_lookback() {
        let mut atr = ATR::new(4).unwrap();
        for i in 0..4 {
            atr.update(&bar(i, 100.0, 101.0, 99.0, 100.0));
            assert!(atr.value().is_none());
        }
        atr.update(&bar(4, 100.0, 101.0, 99.0, 100.0));
        assert_eq!(atr.lookback(), 5);
        assert!(atr.is_ready());
    }
}
