//! Strategy configuration

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Entry rule set used by an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyVariant {
    /// EMA cross + RSI regime, ATR stops with trailing stop
    Baseline,
    /// EMA + RSI + ADX band + volume confirmation, fixed ATR targets
    AdxVolume,
    /// Supertrend direction + stochastic RSI, fixed ATR targets
    SupertrendStoch,
}

impl StrategyVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyVariant::Baseline => "baseline",
            StrategyVariant::AdxVolume => "adx_volume",
            StrategyVariant::SupertrendStoch => "supertrend_stoch",
        }
    }
}

impl std::str::FromStr for StrategyVariant {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "baseline" => Ok(Self::Baseline),
            "adx_volume" | "adx" => Ok(Self::AdxVolume),
            "supertrend_stoch" | "supertrend" => Ok(Self::SupertrendStoch),
            other => Err(EngineError::ConfigInvalid(format!(
                "unknown strategy variant: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable strategy parameter bundle.
///
/// Lengths are in bars, multipliers are in ATR units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub variant: StrategyVariant,
    pub ema_fast_len: usize,
    pub ema_slow_len: usize,
    pub rsi_len: usize,
    /// RSI level separating bullish from bearish regimes, in (0, 100)
    pub rsi_threshold: f64,
    pub atr_len: usize,
    pub atr_mult_sl: f64,
    pub atr_mult_tp: f64,
    pub trailing_mult: f64,
    pub adx_len: Option<usize>,
    /// Entries only while `adx_band.0 <= ADX <= adx_band.1`
    pub adx_band: (f64, f64),
    pub volume_sma_len: Option<usize>,
    pub supertrend_len: Option<usize>,
    pub supertrend_mult: Option<f64>,
    pub stochrsi_len: Option<usize>,
    /// Quantity per entry
    pub order_size: f64,
    pub allow_short: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            variant: StrategyVariant::Baseline,
            ema_fast_len: 9,
            ema_slow_len: 21,
            rsi_len: 14,
            rsi_threshold: 50.0,
            atr_len: 14,
            atr_mult_sl: 2.0,
            atr_mult_tp: 2.6,
            trailing_mult: 1.5,
            adx_len: None,
            adx_band: (20.0, 50.0),
            volume_sma_len: None,
            supertrend_len: None,
            supertrend_mult: None,
            stochrsi_len: None,
            order_size: 1.0,
            allow_short: true,
        }
    }
}

impl StrategyConfig {
    /// EMA+RSI+ADX+volume variant with its usual filter lengths
    pub fn adx_volume() -> Self {
        Self {
            variant: StrategyVariant::AdxVolume,
            adx_len: Some(14),
            volume_sma_len: Some(20),
            ..Self::default()
        }
    }

    /// Supertrend + stochastic RSI variant
    pub fn supertrend_stoch() -> Self {
        Self {
            variant: StrategyVariant::SupertrendStoch,
            supertrend_len: Some(10),
            supertrend_mult: Some(3.0),
            stochrsi_len: Some(14),
            ..Self::default()
        }
    }

    /// Default parameters for a variant
    pub fn for_variant(variant: StrategyVariant) -> Self {
        match variant {
            StrategyVariant::Baseline => Self::default(),
            StrategyVariant::AdxVolume => Self::adx_volume(),
            StrategyVariant::SupertrendStoch => Self::supertrend_stoch(),
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigInvalid(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            EngineError::ConfigInvalid(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Whether the trailing stop is recomputed on every bar
    pub fn trailing_enabled(&self) -> bool {
        self.variant == StrategyVariant::Baseline
    }

    /// Validate once at construction
    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("ema_fast_len", Some(self.ema_fast_len)),
            ("ema_slow_len", Some(self.ema_slow_len)),
            ("rsi_len", Some(self.rsi_len)),
            ("atr_len", Some(self.atr_len)),
            ("adx_len", self.adx_len),
            ("volume_sma_len", self.volume_sma_len),
            ("supertrend_len", self.supertrend_len),
            ("stochrsi_len", self.stochrsi_len),
        ];
        for (name, len) in lengths {
            if len == Some(0) {
                return Err(invalid(format!("{} must be >= 1", name)));
            }
        }

        let multipliers = [
            ("atr_mult_sl", Some(self.atr_mult_sl)),
            ("atr_mult_tp", Some(self.atr_mult_tp)),
            ("trailing_mult", Some(self.trailing_mult)),
            ("supertrend_mult", self.supertrend_mult),
            ("order_size", Some(self.order_size)),
        ];
        for (name, value) in multipliers {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(invalid(format!("{} must be > 0 (got {})", name, v)));
                }
            }
        }

        if !(self.rsi_threshold > 0.0 && self.rsi_threshold < 100.0) {
            return Err(invalid(format!(
                "rsi_threshold must be in (0, 100) (got {})",
                self.rsi_threshold
            )));
        }

        let (low, high) = self.adx_band;
        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
            return Err(invalid(format!(
                "adx_band must satisfy 0 <= min < max <= 100 (got {:?})",
                self.adx_band
            )));
        }

        match self.variant {
            StrategyVariant::Baseline => {}
            StrategyVariant::AdxVolume => {
                if self.adx_len.is_none() || self.volume_sma_len.is_none() {
                    return Err(invalid(
                        "adx_volume variant requires adx_len and volume_sma_len".to_string(),
                    ));
                }
            }
            StrategyVariant::SupertrendStoch => {
                if self.supertrend_len.is_none()
                    || self.supertrend_mult.is_none()
                    || self.stochrsi_len.is_none()
                {
                    return Err(invalid(
                        "supertrend_stoch variant requires supertrend_len, supertrend_mult and stochrsi_len"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Number of candles needed before every configured indicator is defined
    pub fn warmup_len(&self) -> usize {
        let mut lookbacks = vec![
            self.ema_fast_len,
            self.ema_slow_len,
            self.rsi_len + 1,
            self.atr_len + 1,
        ];
        if let Some(n) = self.adx_len {
            lookbacks.push(2 * n);
        }
        if let Some(n) = self.volume_sma_len {
            lookbacks.push(n);
        }
        if let Some(n) = self.supertrend_len {
            lookbacks.push(n + 1);
        }
        if let Some(n) = self.stochrsi_len {
            lookbacks.push(2 * n);
        }
        lookbacks.into_iter().max().unwrap_or(1)
    }
}

fn invalid(msg: String) -> EngineError {
    EngineError::ConfigInvalid(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warmup_len(), 21);
        assert!(config.trailing_enabled());
    }

    #[test]
    fn test_variant_presets_are_valid() {
        assert!(StrategyConfig::adx_volume().validate().is_ok());
        assert!(StrategyConfig::supertrend_stoch().validate().is_ok());
        assert_eq!(StrategyConfig::adx_volume().warmup_len(), 28);
        assert!(!StrategyConfig::adx_volume().trailing_enabled());
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero_len = StrategyConfig {
            rsi_len: 0,
            ..StrategyConfig::default()
        };
        assert!(matches!(zero_len.validate(), Err(EngineError::ConfigInvalid(_))));

        let bad_threshold = StrategyConfig {
            rsi_threshold: 100.0,
            ..StrategyConfig::default()
        };
        assert!(bad_threshold.validate().is_err());

        let bad_mult = StrategyConfig {
            atr_mult_sl: 0.0,
            ..StrategyConfig::default()
        };
        assert!(bad_mult.validate().is_err());

        let missing_filters = StrategyConfig {
            variant: StrategyVariant::AdxVolume,
            ..StrategyConfig::default()
        };
        assert!(missing_filters.validate().is_err());
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let config: StrategyConfig =
            serde_json::from_str(r#"{"ema_fast_len": 5, "variant": "adx_volume", "adx_len": 10, "volume_sma_len": 20}"#)
                .unwrap();
        assert_eq!(config.ema_fast_len, 5);
        assert_eq!(config.ema_slow_len, 21);
        assert_eq!(config.variant, StrategyVariant::AdxVolume);
        assert!(config.validate().is_ok());
    }
}
