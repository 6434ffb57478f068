//! Notification-only execution sink

use crate::error::Result;
use crate::exchange::{ExecutionSink, Order, OrderSide};
use crate::portfolio::PositionSide;
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// Accepts every order without side effects; decisions only reach the
/// notifier. Holds no positions, so broker reconciliation is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalOnlySink;

#[async_trait]
impl ExecutionSink for SignalOnlySink {
    fn name(&self) -> &str {
        "signal"
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
        debug!("Signal only: {} {} @ {:.4}", side, symbol, price);
        Ok(Order::new(
            Uuid::new_v4().to_string(),
            symbol.to_string(),
            OrderSide::from(side),
            size,
            price,
            stop_loss,
            take_profit,
        ))
    }

    async fn close_position(&self, symbol: &str, price: f64) -> Result<()> {
        debug!("Signal only: close {} @ {:.4}", symbol, price);
        Ok(())
    }

    async fn get_open_quantity(&self, _symbol: &str) -> Result<f64> {
        Ok(0.0)
    }

    fn tracks_positions(&self) -> bool {
        false
    }
}
