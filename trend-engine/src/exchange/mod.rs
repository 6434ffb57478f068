//! Exchange module
//!
//! Collaborator traits the drivers talk to, and their adapters: Binance
//! public klines or Alpaca bars for market data, Alpaca bracket orders, a
//! virtual-wallet paper broker and a notification-only sink.

pub mod alpaca;
pub mod alpaca_bars;
pub mod binance;
pub mod order;
pub mod paper;
pub mod signal_only;

pub use alpaca::*;
pub use alpaca_bars::*;
pub use binance::*;
pub use order::*;
pub use paper::*;
pub use signal_only::*;

use crate::data::{Candle, Timeframe};
use crate::error::Result;
use crate::portfolio::PositionSide;
use async_trait::async_trait;

/// Source of OHLCV candles
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Most recent `limit` closed candles, oldest first
    async fn get_window(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>>;
}

/// Performs the side effect of a decision.
///
/// The sink is authoritative on fills: the engine only reports intent.
#[async_trait]
pub trait ExecutionSink: Send + Sync {
    /// Get sink name
    fn name(&self) -> &str;

    /// Open a position with attached stop-loss and take-profit
    async fn place_entry(
        &self,
        symbol: &str,
        side: PositionSide,
        price: f64,
        size: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<Order>;

    /// Close whatever is open on `symbol`; `price` is the engine's exit price
    async fn close_position(&self, symbol: &str, price: f64) -> Result<()>;

    /// Signed open quantity (negative for shorts)
    async fn get_open_quantity(&self, symbol: &str) -> Result<f64>;

    /// Whether `get_open_quantity` reflects real holdings worth reconciling against
    fn tracks_positions(&self) -> bool {
        true
    }
}

/// Exchange symbol for a pair (e.g., "BTC/USDT" -> "BTCUSDT")
pub fn normalize_pair(pair: &str) -> String {
    pair.trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_' | ' '))
        .collect::<String>()
        .to_uppercase()
}
