//! EMA (Exponential Moving Average) indicator

use crate::data::Candle;
use crate::error::Result;
use crate::indicators::{ta_error, Indicator};
use ta::indicators::ExponentialMovingAverage;
use ta::Next;

/// EMA indicator wrapper over closing prices
#[derive(Debug)]
pub struct EMA {
    inner: ExponentialMovingAverage,
    period: usize,
    update_count: usize,
    last_value: Option<f64>,
}

impl EMA {
    /// Create new EMA indicator
    pub fn new(period: usize) -> Result<Self> {
        Ok(Self {
            inner: ExponentialMovingAverage::new(period).map_err(|e| ta_error("EMA", period, e))?,
            period,
            update_count: 0,
            last_value: None,
        })
    }
}

impl Indicator for EMA {
    fn name(&self) -> &str {
        "EMA"
    }

    fn update(&mut self, candle: &Candle) {
        let ema_value = self.inner.next(candle.close);
        self.update_count += 1;
        if self.update_count >= self.period {
            self.last_value = Some(ema_value);
        }
    }

    fn value(&self) -> Option<f64> {
        self.last_value
    }

    fn is_ready(&self) -> bool {
        self.update_count >= self.period
    }

    fn lookback(&self) -> usize {
        self.period
    }
}
