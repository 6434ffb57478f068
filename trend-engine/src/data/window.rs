//! Bounded, time-ordered candle buffer

use crate::data::Candle;
use crate::error::{EngineError, Result};
use std::collections::VecDeque;

/// Default number of candles kept by a window
pub const DEFAULT_WINDOW_CAPACITY: usize = 200;

/// FIFO window of the most recent candles.
///
/// Timestamps are strictly increasing; once `capacity` is reached the
/// oldest candle is evicted on every append.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleWindow {
    /// Create an empty window
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::ConfigInvalid(
                "window capacity must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Build a window by appending `candles` in order
    pub fn from_candles<I>(capacity: usize, candles: I) -> Result<Self>
    where
        I: IntoIterator<Item = Candle>,
    {
        let mut window = Self::new(capacity)?;
        for candle in candles {
            window.append(candle)?;
        }
        Ok(window)
    }

    /// Append a candle, returning the evicted one if the window was full
    pub fn append(&mut self, candle: Candle) -> Result<Option<Candle>> {
        candle.validate()?;
        if let Some(last) = self.candles.back() {
            if candle.timestamp <= last.timestamp {
                return Err(EngineError::InvalidCandle(format!(
                    "timestamp {} does not follow {}",
                    candle.timestamp, last.timestamp
                )));
            }
        }

        let evicted = if self.candles.len() == self.capacity {
            self.candles.pop_front()
        } else {
            None
        };
        self.candles.push_back(candle);
        Ok(evicted)
    }

    /// Get number of candles
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Check if window is empty
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Maximum number of candles kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent candle
    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    /// Get close prices as vector
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candle(i: i64, close: f64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(i);
        Candle::new(close, close + 1.0, close - 1.0, close, 10.0, ts)
    }

    #[test]
    fn test_fifo_eviction() {
        let mut window = CandleWindow::new(3).unwrap();
        for i in 0..3 {
            assert!(window.append(candle(i, 100.0 + i as f64)).unwrap().is_none());
        }
        let evicted = window.append(candle(3, 103.0)).unwrap();
        assert_eq!(evicted.map(|c| c.close), Some(100.0));
        assert_eq!(window.len(), 3);
        assert_eq!(window.closes(), vec![101.0, 102.0, 103.0]);
        assert_eq!(window.latest().map(|c| c.close), Some(103.0));
    }

    #[test]
    fn test_rejects_duplicate_and_out_of_order() {
        let mut window = CandleWindow::new(10).unwrap();
        window.append(candle(5, 100.0)).unwrap();
        assert!(window.append(candle(5, 101.0)).is_err());
        assert!(window.append(candle(4, 101.0)).is_err());
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        assert!(matches!(
            CandleWindow::new(0),
            Err(EngineError::ConfigInvalid(_))
        ));
    }
}
