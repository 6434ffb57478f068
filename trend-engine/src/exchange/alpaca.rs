//! Alpaca brokerage (REST v2, bracket orders)

use crate::error::{EngineError, Result};
use crate::exchange::{normalize_pair, ExecutionSink, Order, OrderSide, OrderStatus};
use crate::portfolio::PositionSide;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Default paper-trading endpoint
pub const ALPACA_PAPER_URL: &str = "https://paper-api.alpaca.markets";

#[derive(Debug, Serialize)]
struct StopLossLeg {
    stop_price: f64,
}

#[derive(Debug, Serialize)]
struct TakeProfitLeg {
    limit_price: f64,
}

#[derive(Debug, Serialize)]
struct BracketOrderRequest<'a> {
    symbol: &'a str,
    qty: String,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    time_in_force: &'static str,
    order_class: &'static str,
    stop_loss: StopLossLeg,
    take_profit: TakeProfitLeg,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    qty: String,
    side: String,
}

/// Account balances
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaAccount {
    pub cash: String,
    pub equity: String,
}

/// Live (or paper) broker account on Alpaca
#[derive(Debug, Clone)]
pub struct AlpacaBroker {
    api_key: String,
    secret_key: String,
    base_url: String,
    pub(crate) client: reqwest::Client,
}

impl AlpacaBroker {
    /// Create new broker client
    pub fn new(api_key: String, secret_key: String, base_url: String) -> Result<Self> {
        if api_key.is_empty() || secret_key.is_empty() {
            return Err(EngineError::ConfigInvalid(
                "Alpaca API key and secret are required".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| EngineError::ConfigInvalid(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            api_key,
            secret_key,
            base_url,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub(crate) fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        self.authed(request)
            .send()
            .await
            .map_err(|e| EngineError::ExecutionFailure(format!("Alpaca request failed: {}", e)))
    }

    /// Fetch account cash and equity
    pub async fn account(&self) -> Result<AlpacaAccount> {
        let response = self.send(self.client.get(self.url("account"))).await?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| EngineError::ExecutionFailure(format!("malformed account: {}", e)))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
    Err(EngineError::ExecutionFailure(format!(
        "Alpaca API error ({}): {}",
        status, error_text
    )))
}

/// Alpaca accepts at most two decimals on bracket legs
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl ExecutionSink for AlpacaBroker {
    fn name(&self) -> &str {
        "alpaca"
    }

    async fn place_entry(
        &self,
        symbol: &str,
        side: PositionSide,
        price: f64,
        size: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<Order> {
        let order_side = OrderSide::from(side);
        let body = BracketOrderRequest {
            symbol,
            qty: size.to_string(),
            side: order_side.as_str(),
            order_type: "market",
            time_in_force: "gtc",
            order_class: "bracket",
            stop_loss: StopLossLeg {
                stop_price: round2(stop_loss),
            },
            take_profit: TakeProfitLeg {
                limit_price: round2(take_profit),
            },
        };

        let response = self.send(self.client.post(self.url("orders")).json(&body)).await?;
        let response = check_status(response).await?;
        let placed: OrderResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ExecutionFailure(format!("malformed order: {}", e)))?;
        info!("Alpaca {} order {} for {} ({})", order_side.as_str(), placed.id, symbol, placed.status);

        let mut order = Order::new(
            placed.id,
            symbol.to_string(),
            order_side,
            size,
            price,
            round2(stop_loss),
            round2(take_profit),
        );
        if placed.status == "filled" {
            order.status = OrderStatus::Filled;
        }
        Ok(order)
    }

    async fn close_position(&self, symbol: &str, _price: f64) -> Result<()> {
        let path = format!("positions/{}", normalize_pair(symbol));
        let response = self.send(self.client.delete(self.url(&path))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!("No Alpaca position to close on {}", symbol);
            return Ok(());
        }
        check_status(response).await?;
        info!("Alpaca position closed on {}", symbol);
        Ok(())
    }

    async fn get_open_quantity(&self, symbol: &str) -> Result<f64> {
        let path = format!("positions/{}", normalize_pair(symbol));
        let response = self.send(self.client.get(self.url(&path))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0.0);
        }
        let response = check_status(response).await?;
        let position: PositionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ExecutionFailure(format!("malformed position: {}", e)))?;
        let qty: f64 = position
            .qty
            .parse()
            .map_err(|_| EngineError::ExecutionFailure(format!("invalid qty: {}", position.qty)))?;
        Ok(if position.side == "short" { -qty.abs() } else { qty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_body() {
        let body = BracketOrderRequest {
            symbol: "BTC/USD",
            qty: 0.5f64.to_string(),
            side: OrderSide::Sell.as_str(),
            order_type: "market",
            time_in_force: "gtc",
            order_class: "bracket",
            stop_loss: StopLossLeg {
                stop_price: round2(104.0049),
            },
            take_profit: TakeProfitLeg {
                limit_price: round2(94.796),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "market");
        assert_eq!(json["qty"], "0.5");
        assert_eq!(json["stop_loss"]["stop_price"], 104.0);
        assert_eq!(json["take_profit"]["limit_price"], 94.8);
    }

    #[test]
    fn test_requires_credentials() {
        assert!(AlpacaBroker::new(String::new(), "s".into(), ALPACA_PAPER_URL.into()).is_err());
    }
}
