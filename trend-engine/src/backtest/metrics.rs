//! Backtest performance metrics

use crate::backtest::{BacktestResult, EquityPoint, Trade};

/// Calculate additional metrics from backtest result
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Gross profit over gross loss; 0 when there are no losing trades
    pub fn profit_factor(result: &BacktestResult) -> f64 {
        let gross_profit: f64 = result.trades.iter().map(|t| t.pnl).filter(|p| *p > 0.0).sum();
        let gross_loss: f64 = result.trades.iter().map(|t| t.pnl).filter(|p| *p < 0.0).sum();
        if gross_loss == 0.0 {
            return 0.0;
        }
        gross_profit / gross_loss.abs()
    }

    /// Calculate expectancy
    pub fn expectancy(result: &BacktestResult) -> f64 {
        if result.num_trades == 0 {
            return 0.0;
        }
        (result.win_rate / 100.0 * result.avg_profit)
            - ((100.0 - result.win_rate) / 100.0 * result.avg_loss.abs())
    }

    /// Largest peak-to-trough fall of the equity curve, as a fraction of the peak
    pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
        let mut peak = f64::MIN;
        let mut max_drawdown = 0.0;
        for point in curve {
            peak = peak.max(point.equity);
            if peak > 0.0 {
                let drawdown = (peak - point.equity) / peak;
                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }
        max_drawdown
    }

    /// Mean over standard deviation of per-trade returns
    pub fn sharpe_ratio(trades: &[Trade]) -> f64 {
        if trades.len() < 2 {
            return 0.0;
        }
        let returns: Vec<f64> = trades.iter().map(|t| t.pnl_percent / 100.0).collect();
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
        let std_dev = variance.sqrt();
        if std_dev > 0.0 {
            mean / std_dev
        } else {
            0.0
        }
    }

    /// Average holding time in hours
    pub fn avg_trade_duration(result: &BacktestResult) -> f64 {
        if result.trades.is_empty() {
            return 0.0;
        }
        let total_minutes: i64 = result
            .trades
            .iter()
            .map(|t| (t.exit_time - t.entry_time).num_minutes())
            .sum();
        total_minutes as f64 / 60.0 / result.trades.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_max_drawdown() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let curve: Vec<EquityPoint> = [1000.0, 1100.0, 880.0, 950.0, 1200.0]
            .iter()
            .enumerate()
            .map(|(i, e)| EquityPoint {
                timestamp: base + Duration::hours(i as i64),
                equity: *e,
            })
            .collect();
        assert!((MetricsCalculator::max_drawdown(&curve) - 0.2).abs() < 1e-9);
        assert_eq!(MetricsCalculator::max_drawdown(&[]), 0.0);
    }
}
