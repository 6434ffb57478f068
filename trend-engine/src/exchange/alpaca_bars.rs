//! Alpaca market data: crypto bars for `BASE/QUOTE` symbols, stock bars
//! for everything else.

use crate::data::{Candle, Timeframe};
use crate::error::{EngineError, Result};
use crate::exchange::{AlpacaBroker, MarketData};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Default market-data endpoint
pub const ALPACA_DATA_URL: &str = "https://data.alpaca.markets";

/// Alpaca caps bar requests at this many rows
const MAX_LIMIT: usize = 10_000;

/// One OHLCV bar as Alpaca returns it
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaBar {
    pub t: DateTime<Utc>,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}

#[derive(Debug, Deserialize)]
struct CryptoBarsResponse {
    #[serde(default)]
    bars: HashMap<String, Vec<AlpacaBar>>,
}

#[derive(Debug, Deserialize)]
struct StockBarsResponse {
    #[serde(default)]
    bars: Option<Vec<AlpacaBar>>,
}

/// Market data from the Alpaca data API, sharing the broker's client and keys
#[derive(Debug, Clone)]
pub struct AlpacaBars {
    broker: AlpacaBroker,
    data_url: String,
}

impl AlpacaBars {
    pub fn new(broker: AlpacaBroker, data_url: impl Into<String>) -> Self {
        Self {
            broker,
            data_url: data_url.into(),
        }
    }

    fn base(&self) -> &str {
        self.data_url.trim_end_matches('/')
    }
}

/// Crypto pairs are written with a slash (`BTC/USD`); stocks are not
pub fn is_crypto_symbol(symbol: &str) -> bool {
    symbol.contains('/')
}

/// Alpaca timeframe names
pub fn alpaca_timeframe(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "1Min",
        Timeframe::M5 => "5Min",
        Timeframe::M15 => "15Min",
        Timeframe::M30 => "30Min",
        Timeframe::H1 => "1Hour",
        Timeframe::H4 => "4Hour",
        Timeframe::D1 => "1Day",
    }
}

#[async_trait]
impl MarketData for AlpacaBars {
    async fn get_window(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let crypto = is_crypto_symbol(symbol);
        // one extra row: the still-forming bar is discarded
        let limit = (limit + 1).min(MAX_LIMIT);
        // stock sessions leave nights and weekends empty
        let spread = if crypto { 2 } else { 5 };
        let span = timeframe.duration() * (limit as i32 * spread) + Duration::days(4);
        let start = (Utc::now() - span).to_rfc3339_opts(SecondsFormat::Secs, true);
        let limit_param = limit.to_string();
        debug!("Fetching {} {} Alpaca bars for {}", limit, timeframe, symbol);

        let mut query = vec![
            ("timeframe", alpaca_timeframe(timeframe)),
            ("limit", limit_param.as_str()),
            ("start", start.as_str()),
            ("sort", "desc"),
        ];
        let url = if crypto {
            query.push(("symbols", symbol));
            format!("{}/v1beta3/crypto/us/bars", self.base())
        } else {
            query.push(("feed", "iex"));
            query.push(("adjustment", "raw"));
            format!("{}/v2/stocks/{}/bars", self.base(), symbol.trim().to_uppercase())
        };

        let response = self
            .broker
            .authed(self.broker.client.get(url).query(&query))
            .send()
            .await
            .map_err(|e| EngineError::DataUnavailable(format!("bars request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EngineError::DataUnavailable(format!(
                "Alpaca data error ({}): {}",
                status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EngineError::DataUnavailable(format!("bars body unreadable: {}", e)))?;
        let bars = if crypto {
            parse_crypto_bars(&body, symbol)?
        } else {
            parse_stock_bars(&body)?
        };
        Ok(closed_candles(bars, timeframe, Utc::now()))
    }
}

/// Bars for `symbol` out of a `/v1beta3/crypto/us/bars` body
pub fn parse_crypto_bars(body: &str, symbol: &str) -> Result<Vec<AlpacaBar>> {
    let mut response: CryptoBarsResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::DataUnavailable(format!("malformed crypto bars: {}", e)))?;
    Ok(response.bars.remove(symbol).unwrap_or_default())
}

/// Bars out of a `/v2/stocks/{symbol}/bars` body
pub fn parse_stock_bars(body: &str) -> Result<Vec<AlpacaBar>> {
    let response: StockBarsResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::DataUnavailable(format!("malformed stock bars: {}", e)))?;
    Ok(response.bars.unwrap_or_default())
}

/// Oldest-first candles, without the bar still forming at `now`
pub fn closed_candles(mut bars: Vec<AlpacaBar>, timeframe: Timeframe, now: DateTime<Utc>) -> Vec<Candle> {
    bars.sort_by_key(|b| b.t);
    bars.into_iter()
        .filter(|b| b.t + timeframe.duration() <= now)
        .map(|b| Candle::new(b.o, b.h, b.l, b.c, b.v, b.t))
        .collect()
}
