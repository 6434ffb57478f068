//! SMA (Simple Moving Average) indicator

use crate::data::Candle;
use crate::error::Result;
use crate::indicators::{ta_error, Indicator};
use ta::indicators::SimpleMovingAverage;
use ta::Next;

/// Candle field an SMA is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Close,
    Volume,
}

/// SMA indicator wrapper
#[derive(Debug)]
pub struct SMA {
    inner: SimpleMovingAverage,
    period: usize,
    source: Source,
    update_count: usize,
    last_value: Option<f64>,
}

impl SMA {
    /// Create new SMA indicator
    pub fn new(period: usize, source: Source) -> Result<Self> {
        Ok(Self {
            inner: SimpleMovingAverage::new(period).map_err(|e| ta_error("SMA", period, e))?,
            period,
            source,
            update_count: 0,
            last_value: None,
        })
    }
}

impl Indicator for SMA {
    fn name(&self) -> &str {
        match self.source {
            Source::Close => "SMA",
            Source::Volume => "VolumeSMA",
        }
    }

    fn update(&mut self, candle: &Candle) {
        let input = match self.source {
            Source::Close => candle.close,
            Source::Volume => candle.volume,
        };
        let sma_value = self.inner.next(input);
        self.update_count += 1;
        if self.update_count >= self.period {
            self.last_value = Some(sma_value);
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
