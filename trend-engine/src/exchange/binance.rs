//! Binance public klines (no credentials)

use crate::data::{Candle, Timeframe};
use crate::error::{EngineError, Result};
use crate::exchange::{normalize_pair, MarketData};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default REST endpoint
pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

/// Binance rejects larger kline requests
const MAX_LIMIT: usize = 1000;

/// Market data from `GET /api/v3/klines`
#[derive(Debug, Clone)]
pub struct BinanceKlines {
    base_url: String,
    client: reqwest::Client,
}

impl BinanceKlines {
    /// Create new client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| EngineError::ConfigInvalid(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn url(&self) -> String {
        format!("{}/api/v3/klines", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl MarketData for BinanceKlines {
    async fn get_window(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let pair = normalize_pair(symbol);
        // one extra row: the still-forming kline is discarded
        let limit = (limit + 1).min(MAX_LIMIT);
        let limit_param = limit.to_string();
        debug!("Fetching {} {} klines for {}", limit, timeframe, pair);

        let response = self
            .client
            .get(self.url())
            .query(&[
                ("symbol", pair.as_str()),
                ("interval", timeframe.as_str()),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| EngineError::DataUnavailable(format!("klines request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EngineError::DataUnavailable(format!(
                "Binance API error ({}): {}",
                status, error_text
            )));
        }

        let rows: Vec<Vec<Value>> = response
            .json()
            .await
            .map_err(|e| EngineError::DataUnavailable(format!("malformed klines: {}", e)))?;
        parse_klines(&rows, Utc::now())
    }
}

/// Convert kline rows into candles, dropping klines that close after `now`
pub fn parse_klines(rows: &[Vec<Value>], now: DateTime<Utc>) -> Result<Vec<Candle>> {
    let now_ms = now.timestamp_millis();
    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() < 7 {
            return Err(EngineError::DataUnavailable(format!(
                "kline row has {} fields",
                row.len()
            )));
        }
        let close_time = int_field(&row[6])?;
        if close_time > now_ms {
            continue;
        }
        let open_time = Utc
            .timestamp_millis_opt(int_field(&row[0])?)
            .single()
            .ok_or_else(|| EngineError::DataUnavailable("invalid kline open time".to_string()))?;
        candles.push(Candle::new(
            float_field(&row[1])?,
            float_field(&row[2])?,
            float_field(&row[3])?,
            float_field(&row[4])?,
            float_field(&row[5])?,
            open_time,
        ));
    }
    Ok(candles)
}

fn int_field(value: &Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| EngineError::DataUnavailable(format!("expected integer, got {}", value)))
}

/// Prices and volumes arrive as decimal strings
fn float_field(value: &Value) -> Result<f64> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|_| EngineError::DataUnavailable(format!("invalid number: {}", s))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| EngineError::DataUnavailable(format!("invalid number: {}", n))),
        other => Err(EngineError::DataUnavailable(format!("expected number, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_drops_open_kline() {
        let rows: Vec<Vec<Value>> = serde_json::from_value(json!([
            [1704067200000i64, "100.0", "101.5", "99.0", "101.0", "12.5", 1704070799999i64, "0", 10, "0", "0", "0"],
            [1704070800000i64, "101.0", "102.0", "100.5", "101.8", "8.0", 1704074399999i64, "0", 10, "0", "0", "0"]
        ]))
        .unwrap();
        let now = Utc.timestamp_millis_opt(1704072000000).unwrap();

        let candles = parse_klines(&rows, now).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close, 101.0);
        assert_eq!(candles[0].volume, 12.5);
        assert_eq!(candles[0].timestamp.timestamp_millis(), 1704067200000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let rows: Vec<Vec<Value>> = vec![vec![json!(1), json!("x")]];
        assert!(parse_klines(&rows, Utc::now()).is_err());
    }
}
