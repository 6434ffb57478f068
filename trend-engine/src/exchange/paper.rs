//! Paper trading over a virtual wallet

use crate::error::{EngineError, Result};
use crate::exchange::{ExecutionSink, Order, OrderSide};
use crate::portfolio::{PositionSide, VirtualWallet};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Spot-only simulated broker; fills immediately at the decision price
#[derive(Debug)]
pub struct PaperBroker {
    wallet: Mutex<VirtualWallet>,
}

impl PaperBroker {
    /// Create new paper broker with a fresh wallet
    pub fn new(starting_balance: f64) -> Self {
        Self {
            wallet: Mutex::new(VirtualWallet::new(starting_balance)),
        }
    }

    /// Copy of the current wallet
    pub async fn wallet(&self) -> VirtualWallet {
        self.wallet.lock().await.clone()
    }
}

#[async_trait]
impl ExecutionSink for PaperBroker {
    fn name(&self) -> &str {
        "paper"
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
        if side == PositionSide::Short {
            return Err(EngineError::ExecutionFailure(
                "paper wallet is spot-only: short entries are not supported".to_string(),
            ));
        }

        let mut wallet = self.wallet.lock().await;
        let cost = wallet.buy(price, size)?;
        info!(
            "Paper BUY {} {} @ {:.4} (cost {:.2}, balance {:.2})",
            size, symbol, price, cost, wallet.balance
        );
        Ok(Order::new(
            Uuid::new_v4().to_string(),
            symbol.to_string(),
            OrderSide::Buy,
            size,
            price,
            stop_loss,
            take_profit,
        )
        .filled())
    }

    async fn close_position(&self, symbol: &str, price: f64) -> Result<()> {
        let mut wallet = self.wallet.lock().await;
        let proceeds = wallet.sell_all(price)?;
        info!(
            "Paper SELL {} @ {:.4} (proceeds {:.2}, balance {:.2})",
            symbol, price, proceeds, wallet.balance
        );
        Ok(())
    }

    async fn get_open_quantity(&self, _symbol: &str) -> Result<f64> {
        Ok(self.wallet.lock().await.asset_quantity)
    }
}
