//! Backtest report generation

use crate::backtest::BacktestResult;
use crate::backtest::MetricsCalculator;
use std::fmt::Write;

/// Backtest report
#[derive(Debug)]
pub struct BacktestReport {
    result: BacktestResult,
    profit_factor: f64,
    expectancy: f64,
    avg_duration_hours: f64,
}

impl BacktestReport {
    /// Create new report from result
    pub fn new(result: BacktestResult) -> Self {
        let profit_factor = MetricsCalculator::profit_factor(&result);
        let expectancy = MetricsCalculator::expectancy(&result);
        let avg_duration_hours = MetricsCalculator::avg_trade_duration(&result);

        Self {
            result,
            profit_factor,
            expectancy,
            avg_duration_hours,
        }
    }

    /// Format report as string
    pub fn format(&self) -> String {
        format!(
            r#"
Backtest Results: {}
================
Starting Balance: ${:.2}
Ending Balance: ${:.2}
Total Return: ${:.2} ({:.2}%)
Number of Trades: {}
Winning Trades: {}
Losing Trades: {}
Win Rate: {:.2}%
Average Profit: ${:.2}
Average Loss: ${:.2}
Profit Factor: {:.2}
Expectancy: ${:.2}
Average Duration: {:.1}h
Commission Paid: ${:.2}
Maximum Drawdown: {:.2}%
Sharpe Ratio: {:.2}
"#,
            self.result.symbol,
            self.result.start_balance,
            self.result.end_balance,
            self.result.total_return,
            self.result.total_return_percent,
            self.result.num_trades,
            self.result.winning_trades,
            self.result.losing_trades,
            self.result.win_rate,
            self.result.avg_profit,
            self.result.avg_loss,
            self.profit_factor,
            self.expectancy,
            self.avg_duration_hours,
            self.result.commission_paid,
            self.result.max_drawdown * 100.0,
            self.result.sharpe_ratio,
        )
    }

    /// Trade journal, one line per closed trade
    pub fn format_trades(&self) -> String {
        let mut out = String::from("Trades\n======\n");
        for (i, t) in self.result.trades.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>3}. {:<5} {} -> {}  {:.4} -> {:.4}  pnl {:+.2} ({:+.2}%)  [{}]",
                i + 1,
                t.side,
                t.entry_time.format("%Y-%m-%d %H:%M"),
                t.exit_time.format("%Y-%m-%d %H:%M"),
                t.entry_price,
                t.exit_price,
                t.pnl,
                t.pnl_percent,
                t.exit_reason,
            );
        }
        out
    }

    /// Get result reference
    pub fn result(&self) -> &BacktestResult {
        &self.result
    }
}
