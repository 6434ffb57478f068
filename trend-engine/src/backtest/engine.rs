//! Replay driver
//!
//! Appends a fixed candle sequence to the window one candle at a time and
//! runs the engine after each append, keeping the decision audit trail and
//! a running equity ledger.

use crate::backtest::MetricsCalculator;
use crate::config::{RunnerConfig, StrategyConfig};
use crate::data::{sanitize, Candle, CandleWindow};
use crate::engine::SignalEngine;
use crate::error::Result;
use crate::portfolio::{Position, PositionSide, PositionState};
use crate::strategy::{Action, Decision, ExitReason};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Backtest result
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub symbol: String,
    /// Starting balance
    pub start_balance: f64,
    /// Ending balance
    pub end_balance: f64,
    /// Total return
    pub total_return: f64,
    /// Total return percentage
    pub total_return_percent: f64,
    /// Number of trades
    pub num_trades: usize,
    /// Winning trades
    pub winning_trades: usize,
    /// Losing trades
    pub losing_trades: usize,
    /// Win rate
    pub win_rate: f64,
    /// Average profit
    pub avg_profit: f64,
    /// Average loss
    pub avg_loss: f64,
    /// Maximum drawdown (fraction of peak equity)
    pub max_drawdown: f64,
    /// Sharpe ratio over per-trade returns
    pub sharpe_ratio: f64,
    pub commission_paid: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Trade record
#[derive(Debug, Clone, Serialize)]
pub struct Trade {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    /// Net of both commissions
    pub pnl: f64,
    pub pnl_percent: f64,
    pub exit_reason: ExitReason,
}

/// Mark-to-market equity after one candle
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Output of one replay run
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// One decision per processed candle, plus the end-of-data close
    pub decisions: Vec<Decision>,
    pub result: BacktestResult,
}

impl ReplayReport {
    /// Decisions other than HOLD
    pub fn actions(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(|d| !d.is_hold())
    }
}

/// Replay (backtest) driver
#[derive(Debug, Clone)]
pub struct ReplayDriver {
    strategy: StrategyConfig,
    runner: RunnerConfig,
}

impl ReplayDriver {
    /// Create new replay driver; both configurations are validated here
    pub fn new(strategy: StrategyConfig, runner: RunnerConfig) -> Result<Self> {
        strategy.validate()?;
        runner.validate(&strategy)?;
        Ok(Self { strategy, runner })
    }

    /// Run a replay over `candles`.
    ///
    /// Every run starts from a fresh window, flat position and the
    /// configured starting balance.
    pub fn run(&self, candles: &[Candle]) -> Result<ReplayReport> {
        let candles = sanitize(
            candles.to_vec(),
            self.runner.timeframe,
            self.runner.max_missing_bars,
        );
        info!(
            "Replaying {} candles for {} ({}, {})",
            candles.len(),
            self.runner.symbol,
            self.strategy.variant,
            self.runner.timeframe
        );

        let mut engine = SignalEngine::new(self.strategy.clone())?;
        let mut window = CandleWindow::new(self.runner.window_capacity)?;
        let mut ledger = Ledger::new(
            &self.runner.symbol,
            self.runner.starting_balance,
            self.runner.commission,
        );
        let mut decisions = Vec::with_capacity(candles.len() + 1);

        for candle in &candles {
            window.append(candle.clone())?;
            let decision = engine.evaluate(&window)?;
            ledger.apply(&decision, engine.position());
            ledger.mark(candle);
            decisions.push(decision);
        }

        if let (PositionState::Open(position), Some(last)) = (engine.position().clone(), candles.last()) {
            debug!("Closing {} position at end of data", position.side);
            let decision = Decision::exit(
                position.side,
                last.close,
                position.size,
                ExitReason::EndOfData,
                last.timestamp,
            );
            engine.force_flat();
            ledger.apply(&decision, engine.position());
            ledger.mark(last);
            decisions.push(decision);
        }

        let result = ledger.finish();
        info!(
            "Replay finished: {} trades, return {:.2}%",
            result.num_trades, result.total_return_percent
        );
        Ok(ReplayReport { decisions, result })
    }
}

/// Fixed-size fills at the decision price, commission on each side
struct Ledger {
    symbol: String,
    start_balance: f64,
    commission: f64,
    cash: f64,
    commission_paid: f64,
    open: Option<(Position, f64)>,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
}

impl Ledger {
    fn new(symbol: &str, start_balance: f64, commission: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            start_balance,
            commission,
            cash: start_balance,
            commission_paid: 0.0,
            open: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Book `decision`; `state` is the engine position after it
    fn apply(&mut self, decision: &Decision, state: &PositionState) {
        match decision.action {
            Action::EnterLong | Action::EnterShort => {
                let Some(position) = state.position() else {
                    warn!("Entry decision without an open position, ignoring");
                    return;
                };
                let fee = position.entry_value() * self.commission;
                self.cash -= fee;
                self.commission_paid += fee;
                self.open = Some((position.clone(), fee));
            }
            Action::Exit => {
                let Some((position, entry_fee)) = self.open.take() else {
                    warn!("Exit decision without a booked position, ignoring");
                    return;
                };
                let exit_fee = decision.price * position.size * self.commission;
                let gross = position.unrealized_pnl(decision.price);
                self.cash += gross - exit_fee;
                self.commission_paid += exit_fee;

                let pnl = gross - entry_fee - exit_fee;
                let entry_value = position.entry_value();
                self.trades.push(Trade {
                    entry_time: position.entry_time,
                    exit_time: decision.timestamp,
                    symbol: self.symbol.clone(),
                    side: position.side,
                    entry_price: position.entry_price,
                    exit_price: decision.price,
                    quantity: position.size,
                    pnl,
                    pnl_percent: if entry_value > 0.0 {
                        pnl / entry_value * 100.0
                    } else {
                        0.0
                    },
                    exit_reason: decision.exit_reason.unwrap_or(ExitReason::EndOfData),
                });
            }
            Action::Hold => {}
        }
    }

    /// Record mark-to-market equity at the candle close
    fn mark(&mut self, candle: &Candle) {
        let equity = self.equity(candle.close);
        match self.equity_curve.last_mut() {
            Some(last) if last.timestamp == candle.timestamp => last.equity = equity,
            _ => self.equity_curve.push(EquityPoint {
                timestamp: candle.timestamp,
                equity,
            }),
        }
    }

    fn equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .open
                .as_ref()
                .map_or(0.0, |(position, _)| position.unrealized_pnl(price))
    }

    fn finish(self) -> BacktestResult {
        let end_balance = self.cash;
        let total_return = end_balance - self.start_balance;
        let total_return_percent = if self.start_balance > 0.0 {
            total_return / self.start_balance * 100.0
        } else {
            0.0
        };

        let winning_trades = self.trades.iter().filter(|t| t.pnl > 0.0).count();
        let losing_trades = self.trades.iter().filter(|t| t.pnl < 0.0).count();
        let win_rate = if self.trades.is_empty() {
            0.0
        } else {
            (winning_trades as f64 / self.trades.len() as f64) * 100.0
        };

        let avg_profit = average(self.trades.iter().map(|t| t.pnl).filter(|p| *p > 0.0));
        let avg_loss = average(self.trades.iter().map(|t| t.pnl).filter(|p| *p < 0.0));

        BacktestResult {
            symbol: self.symbol,
            start_balance: self.start_balance,
            end_balance,
            total_return,
            total_return_percent,
            num_trades: self.trades.len(),
            winning_trades,
            losing_trades,
            win_rate,
            avg_profit,
            avg_loss,
            max_drawdown: MetricsCalculator::max_drawdown(&self.equity_curve),
            sharpe_ratio: MetricsCalculator::sharpe_ratio(&self.trades),
            commission_paid: self.commission_paid,
            trades: self.trades,
            equity_curve: self.equity_curve,
        }
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Timeframe;
    use chrono::{Duration, TimeZone};

    fn series(closes: &[f64]) -> Vec<Candle> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Candle::new(*c, c + 0.5, c - 0.5, *c, 100.0, base + Duration::hours(i as i64)))
            .collect()
    }

    fn driver(commission: f64) -> ReplayDriver {
        let runner = RunnerConfig::new("BTC/USDT", Timeframe::H1)
            .with_commission(commission)
            .with_window_capacity(100);
        ReplayDriver::new(StrategyConfig::default(), runner).unwrap()
    }

    #[test]
    fn test_uptrend_closes_at_end_of_data() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 0.2).collect();
        let report = driver(0.0).run(&series(&closes)).unwrap();

        assert_eq!(report.decisions.len(), 41);
        let last_trade = report.result.trades.last().unwrap();
        assert_eq!(last_trade.side, PositionSide::Long);
        assert_eq!(last_trade.exit_reason, ExitReason::EndOfData);
        assert!(report.result.end_balance > report.result.start_balance);
        assert_eq!(report.result.equity_curve.len(), 40);
    }

    #[test]
    fn test_commission_reduces_result() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 0.2).collect();
        let free = driver(0.0).run(&series(&closes)).unwrap().result;
        let paid = driver(0.001).run(&series(&closes)).unwrap().result;
        assert!(paid.commission_paid > 0.0);
        assert!((free.end_balance - paid.end_balance - paid.commission_paid).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_never_trades() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let report = driver(0.0).run(&series(&closes)).unwrap();
        assert!(report.decisions.iter().all(|d| d.is_hold()));
        assert_eq!(report.result.num_trades, 0);
        assert_eq!(report.result.end_balance, 1000.0);
    }

    #[test]
    fn test_rejects_window_below_warmup() {
        let runner = RunnerConfig::new("BTC/USDT", Timeframe::H1).with_window_capacity(10);
        assert!(ReplayDriver::new(StrategyConfig::default(), runner).is_err());
    }
}
