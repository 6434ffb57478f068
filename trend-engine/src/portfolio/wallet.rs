//! Virtual wallet for paper trading

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Spot wallet holding a quote-currency balance and one asset quantity.
///
/// Owned by exactly one simulation run; `reset` restores the starting
/// balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualWallet {
    starting_balance: f64,
    /// Quote currency balance (e.g. USDT)
    pub balance: f64,
    /// Base asset quantity held
    pub asset_quantity: f64,
}

impl VirtualWallet {
    /// Create new wallet
    pub fn new(starting_balance: f64) -> Self {
        Self {
            starting_balance,
            balance: starting_balance,
            asset_quantity: 0.0,
        }
    }

    /// Check if can afford amount
    pub fn can_afford(&self, amount: f64) -> bool {
        self.balance >= amount
    }

    /// Debit `price * size` and add `size` to the asset quantity
    pub fn buy(&mut self, price: f64, size: f64) -> Result<f64> {
        if !(price > 0.0 && size > 0.0) {
            return Err(EngineError::ExecutionFailure(format!(
                "invalid buy: price={} size={}",
                price, size
            )));
        }
        let cost = price * size;
        if !self.can_afford(cost) {
            return Err(EngineError::ExecutionFailure(format!(
                "insufficient funds: need {:.2}, have {:.2}",
                cost, self.balance
            )));
        }
        self.balance -= cost;
        self.asset_quantity += size;
        Ok(cost)
    }

    /// Credit `price * asset_quantity` and zero the asset quantity
    pub fn sell_all(&mut self, price: f64) -> Result<f64> {
        if self.asset_quantity <= 0.0 {
            return Err(EngineError::ExecutionFailure(
                "no asset quantity to sell".to_string(),
            ));
        }
        let proceeds = price * self.asset_quantity;
        self.balance += proceeds;
        self.asset_quantity = 0.0;
        Ok(proceeds)
    }

    /// Total value at `price`
    pub fn equity(&self, price: f64) -> f64 {
        self.balance + self.asset_quantity * price
    }

    pub fn starting_balance(&self) -> f64 {
        self.starting_balance
    }

    /// Restore the starting balance and drop any holdings
    pub fn reset(&mut self) {
        self.balance = self.starting_balance;
        self.asset_quantity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds() {
        let mut wallet = VirtualWallet::new(10.0);
        let err = wallet.buy(50000.0, 0.001).unwrap_err();
        assert!(matches!(err, EngineError::ExecutionFailure(_)));
        assert_eq!(wallet.balance, 10.0);
        assert_eq!(wallet.asset_quantity, 0.0);
    }

    #[test]
    fn test_sell_without_holdings() {
        let mut wallet = VirtualWallet::new(1000.0);
        assert!(wallet.sell_all(100.0).is_err());
    }

    #[test]
    fn test_reset() {
        let mut wallet = VirtualWallet::new(1000.0);
        wallet.buy(100.0, 2.0).unwrap();
        assert_eq!(wallet.equity(110.0), 1020.0);
        wallet.reset();
        assert_eq!(wallet.balance, 1000.0);
        assert_eq!(wallet.asset_quantity, 0.0);
    }
}
