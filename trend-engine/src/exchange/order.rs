//! Order management

use crate::portfolio::PositionSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy
    Buy,
    /// Sell
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl From<PositionSide> for OrderSide {
    /// Side of the order that opens a position
    fn from(side: PositionSide) -> Self {
        match side {
            PositionSide::Long => OrderSide::Buy,
            PositionSide::Short => OrderSide::Sell,
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted, not yet filled
    Pending,
    /// Filled
    Filled,
}

/// Entry order reference returned by an execution sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID (broker-assigned, or generated locally)
    pub id: String,
    /// Symbol
    pub symbol: String,
    /// Order side
    pub side: OrderSide,
    /// Quantity
    pub quantity: f64,
    /// Reference price at submission
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Status
    pub status: OrderStatus,
    /// Created time
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create new order
    pub fn new(
        id: String,
        symbol: String,
        side: OrderSide,
        quantity: f64,
        price: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Self {
        Self {
            id,
            symbol,
            side,
            quantity,
            price,
            stop_loss,
            take_profit,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Mark as filled
    pub fn filled(mut self) -> Self {
        self.status = OrderStatus::Filled;
        self
    }
}
