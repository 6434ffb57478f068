//! Engine decisions

use crate::portfolio::PositionSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    EnterLong,
    EnterShort,
    Exit,
    Hold,
}

impl Action {
    pub fn is_entry(&self) -> bool {
        matches!(self, Action::EnterLong | Action::EnterShort)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::EnterLong => "ENTER_LONG",
            Action::EnterShort => "ENTER_SHORT",
            Action::Exit => "EXIT",
            Action::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TrendReversal,
    /// Position still open when the replay ran out of candles
    EndOfData,
    /// Broker reported no open quantity while the engine held a position
    BrokerClosed,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop loss",
            ExitReason::TakeProfit => "take profit",
            ExitReason::TrendReversal => "trend reversal",
            ExitReason::EndOfData => "end of data",
            ExitReason::BrokerClosed => "closed by broker",
        };
        f.write_str(s)
    }
}

/// Engine output for one processed candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    /// Entry price, exit fill price, or the latest close for HOLD
    pub price: f64,
    /// Active stop loss (entries and HOLD while in a position)
    pub stop_loss: Option<f64>,
    /// Active take profit
    pub take_profit: Option<f64>,
    pub size: Option<f64>,
    /// Side being entered or exited
    pub side: Option<PositionSide>,
    pub exit_reason: Option<ExitReason>,
    /// Timestamp of the candle that produced the decision
    pub timestamp: DateTime<Utc>,
    /// Human readable reason
    pub reason: String,
}

impl Decision {
    /// Create an entry decision
    pub fn enter(side: PositionSide, price: f64, size: f64, timestamp: DateTime<Utc>, reason: String) -> Self {
        Self {
            action: match side {
                PositionSide::Long => Action::EnterLong,
                PositionSide::Short => Action::EnterShort,
            },
            price,
            stop_loss: None,
            take_profit: None,
            size: Some(size),
            side: Some(side),
            exit_reason: None,
            timestamp,
            reason,
        }
    }

    /// Create an exit decision
    pub fn exit(
        side: PositionSide,
        price: f64,
        size: f64,
        exit_reason: ExitReason,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            action: Action::Exit,
            price,
            stop_loss: None,
            take_profit: None,
            size: Some(size),
            side: Some(side),
            exit_reason: Some(exit_reason),
            timestamp,
            reason: exit_reason.to_string(),
        }
    }

    /// Create hold decision
    pub fn hold(price: f64, timestamp: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            action: Action::Hold,
            price,
            stop_loss: None,
            take_profit: None,
            size: None,
            side: None,
            exit_reason: None,
            timestamp,
            reason: reason.into(),
        }
    }

    /// Set stop loss
    pub fn with_stop_loss(mut self, stop_loss: f64) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    /// Set take profit
    pub fn with_take_profit(mut self, take_profit: f64) -> Self {
        self.take_profit = Some(take_profit);
        self
    }

    /// Set the side the decision refers to
    pub fn with_side(mut self, side: PositionSide) -> Self {
        self.side = Some(side);
        self
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}
