//! Position tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    /// Long position
    Long,
    /// Short position
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short
    pub fn sign(&self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            PositionSide::Long => PositionSide::Short,
            PositionSide::Short => PositionSide::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "long",
            PositionSide::Short => "short",
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Open position with its active risk levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Position side (Long/Short)
    pub side: PositionSide,
    /// Entry price
    pub entry_price: f64,
    /// Stop loss price
    pub stop_loss: f64,
    /// Take profit price
    pub take_profit: f64,
    /// Quantity
    pub size: f64,
    /// Timestamp of the candle the position was opened on
    pub entry_time: DateTime<Utc>,
}

impl Position {
    /// Create new position
    pub fn new(
        side: PositionSide,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
        size: f64,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            side,
            entry_price,
            stop_loss,
            take_profit,
            size,
            entry_time,
        }
    }

    /// Unrealized P&L at `price`
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.size * self.side.sign()
    }

    /// Unrealized P&L percentage at `price`
    pub fn unrealized_pnl_percent(&self, price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.entry_price * 100.0 * self.side.sign()
    }

    /// Get entry value
    pub fn entry_value(&self) -> f64 {
        self.entry_price * self.size
    }
}

/// Coarse position state, used as part of the polling dedup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionKind {
    Flat,
    Long,
    Short,
}

/// Position state of one engine instance: FLAT, or exactly one open position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PositionState {
    #[default]
    Flat,
    Open(Position),
}

impl PositionState {
    pub fn kind(&self) -> PositionKind {
        match self {
            PositionState::Flat => PositionKind::Flat,
            PositionState::Open(p) if p.side == PositionSide::Long => PositionKind::Long,
            PositionState::Open(_) => PositionKind::Short,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionState::Flat => None,
            PositionState::Open(p) => Some(p),
        }
    }

    pub fn side(&self) -> Option<PositionSide> {
        self.position().map(|p| p.side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pnl_by_side() {
        let now = Utc::now();
        let long = Position::new(PositionSide::Long, 100.0, 96.0, 105.2, 2.0, now);
        assert_eq!(long.unrealized_pnl(110.0), 20.0);
        assert_eq!(long.unrealized_pnl_percent(110.0), 10.0);

        let short = Position::new(PositionSide::Short, 100.0, 104.0, 94.8, 2.0, now);
        assert_eq!(short.unrealized_pnl(110.0), -20.0);
    }

    #[test]
    fn test_state_kind() {
        assert_eq!(PositionState::Flat.kind(), PositionKind::Flat);
        let open = PositionState::Open(Position::new(
            PositionSide::Short,
            100.0,
            104.0,
            94.8,
            1.0,
            Utc::now(),
        ));
        assert_eq!(open.kind(), PositionKind::Short);
        assert_eq!(open.side(), Some(PositionSide::Short));
        assert!(!open.is_flat());
    }
}
