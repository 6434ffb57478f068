//! Read-only view of the latest indicator values for one window

use crate::config::StrategyConfig;
use crate::data::CandleWindow;
use crate::error::{EngineError, Result};
use crate::indicators::{
    Indicator, Source, StochRSI, Supertrend, TrendDirection, ADX, ATR, EMA, RSI, SMA,
};
use serde::Serialize;

/// Latest value of every configured indicator.
///
/// `None` means undefined: either the window is shorter than the
/// indicator's lookback or the indicator is not configured. Decisions that
/// read an undefined value must resolve to HOLD.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    /// Number of candles the snapshot was computed from
    pub bars: usize,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
    pub volume_sma: Option<f64>,
    pub supertrend: Option<f64>,
    pub trend_direction: Option<TrendDirection>,
    pub stoch_rsi: Option<f64>,
}

impl IndicatorSnapshot {
    /// Recompute every configured indicator over the whole window.
    ///
    /// No state survives between calls, so the cost is O(window length)
    /// per call and the result depends on nothing but `window` and `config`.
    pub fn compute(window: &CandleWindow, config: &StrategyConfig) -> Result<Self> {
        let mut ema_fast = EMA::new(config.ema_fast_len)?;
        let mut ema_slow = EMA::new(config.ema_slow_len)?;
        let mut rsi = RSI::new(config.rsi_len)?;
        let mut atr = ATR::new(config.atr_len)?;
        let mut adx = config.adx_len.map(ADX::new).transpose()?;
        let mut volume_sma = config
            .volume_sma_len
            .map(|n| SMA::new(n, Source::Volume))
            .transpose()?;
        let mut supertrend = match (config.supertrend_len, config.supertrend_mult) {
            (Some(n), Some(mult)) => Some(Supertrend::new(n, mult)?),
            _ => None,
        };
        let mut stoch_rsi = config.stochrsi_len.map(StochRSI::new).transpose()?;

        for candle in window.iter() {
            ema_fast.update(candle);
            ema_slow.update(candle);
            rsi.update(candle);
            atr.update(candle);
            if let Some(ind) = adx.as_mut() {
                ind.update(candle);
            }
            if let Some(ind) = volume_sma.as_mut() {
                ind.update(candle);
            }
            if let Some(ind) = supertrend.as_mut() {
                ind.update(candle);
            }
            if let Some(ind) = stoch_rsi.as_mut() {
                ind.update(candle);
            }
        }

        let latest = window.latest();
        Ok(Self {
            bars: window.len(),
            close: latest.map(|c| c.close),
            volume: latest.map(|c| c.volume),
            ema_fast: defined(ema_fast.value()),
            ema_slow: defined(ema_slow.value()),
            rsi: defined(rsi.value()),
            atr: defined(atr.value()),
            adx: defined(adx.as_ref().and_then(|i| i.value())),
            volume_sma: defined(volume_sma.as_ref().and_then(|i| i.value())),
            supertrend: defined(supertrend.as_ref().and_then(|i| i.value())),
            trend_direction: supertrend.as_ref().and_then(|i| i.direction()),
            stoch_rsi: defined(stoch_rsi.as_ref().and_then(|i| i.value())),
        })
    }

    /// Look up a value by indicator name
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "close" => self.close,
            "volume" => self.volume,
            "ema_fast" => self.ema_fast,
            "ema_slow" => self.ema_slow,
            "rsi" => self.rsi,
            "atr" => self.atr,
            "adx" => self.adx,
            "volume_sma" => self.volume_sma,
            "supertrend" => self.supertrend,
            "trend_direction" => self.trend_direction.map(|d| d.as_f64()),
            "stoch_rsi" => self.stoch_rsi,
            _ => None,
        }
    }

    /// All named values, undefined ones included
    pub fn values(&self) -> Vec<(&'static str, Option<f64>)> {
        [
            "close",
            "volume",
            "ema_fast",
            "ema_slow",
            "rsi",
            "atr",
            "adx",
            "volume_sma",
            "supertrend",
            "trend_direction",
            "stoch_rsi",
        ]
        .into_iter()
        .map(|name| (name, self.get(name)))
        .collect()
    }

    /// Get a value or fail with [`EngineError::IndicatorUndefined`]
    pub fn require(&self, name: &'static str) -> Result<f64> {
        self.get(name).ok_or(EngineError::IndicatorUndefined(name))
    }

    /// Trend direction or [`EngineError::IndicatorUndefined`]
    pub fn require_direction(&self) -> Result<TrendDirection> {
        self.trend_direction
            .ok_or(EngineError::IndicatorUndefined("trend_direction"))
    }
}

fn defined(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Candle, CandleWindow};
    use chrono::{Duration, TimeZone, Utc};

    fn window(n: usize) -> CandleWindow {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        CandleWindow::from_candles(
            200,
            (0..n).map(|i| {
                let c = 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1;
                Candle::new(c, c + 1.0, c - 1.0, c, 10.0 + i as f64, base + Duration::hours(i as i64))
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_undefined_until_warm() {
        let config = StrategyConfig::default();
        let snap = IndicatorSnapshot::compute(&window(10), &config).unwrap();
        assert!(snap.ema_fast.is_some());
        assert!(snap.ema_slow.is_none());
        assert!(matches!(
            snap.require("ema_slow"),
            Err(EngineError::IndicatorUndefined("ema_slow"))
        ));

        let snap = IndicatorSnapshot::compute(&window(config.warmup_len()), &config).unwrap();
        for name in ["ema_fast", "ema_slow", "rsi", "atr"] {
            assert!(snap.get(name).is_some(), "{} undefined", name);
        }
        assert!(snap.adx.is_none());
    }

    #[test]
    fn test_optional_indicators_follow_warmup_len() {
        for config in [StrategyConfig::adx_volume(), StrategyConfig::supertrend_stoch()] {
            let warm = config.warmup_len();
            let cold = IndicatorSnapshot::compute(&window(warm - 1), &config).unwrap();
            let hot = IndicatorSnapshot::compute(&window(warm), &config).unwrap();
            let undefined_cold = cold.values().iter().filter(|(_, v)| v.is_none()).count();
            let undefined_hot = hot.values().iter().filter(|(_, v)| v.is_none()).count();
            assert!(undefined_cold > undefined_hot);
            match config.variant {
                crate::config::StrategyVariant::AdxVolume => {
                    assert!(hot.adx.is_some() && hot.volume_sma.is_some());
                }
                _ => {
                    assert!(hot.trend_direction.is_some() && hot.stoch_rsi.is_some());
                }
            }
        }
    }

    #[test]
    fn test_empty_window() {
        let empty = CandleWindow::new(10).unwrap();
        let snap = IndicatorSnapshot::compute(&empty, &StrategyConfig::default()).unwrap();
        assert_eq!(snap.bars, 0);
        assert!(snap.close.is_none());
    }

    #[test]
    fn test_serializes_with_trend_direction() {
        let config = StrategyConfig::supertrend_stoch();
        let snap = IndicatorSnapshot::compute(&window(60), &config).unwrap();
        let json = serde_json::to_value(&snap).unwrap();
        let direction = json["trend_direction"].as_str().unwrap();
        assert!(direction == "up" || direction == "down");
        assert_eq!(json["bars"], 60);
    }
}
