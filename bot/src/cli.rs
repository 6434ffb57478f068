use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trend_engine::config::StrategyVariant;
use trend_engine::data::Timeframe;

#[derive(Debug, Parser)]
#[command(name = "bot", about = "EMA/RSI/ATR trend signal bot", version)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay historical candles and print the backtest report
    Backtest(BacktestArgs),
    /// Poll live candles and forward signals until Ctrl-C
    Run(RunArgs),
    /// Print build information
    Version,
}

#[derive(Debug, Args)]
pub struct StrategyArgs {
    /// Strategy parameters as JSON; missing fields take their defaults
    #[arg(long)]
    pub strategy: Option<PathBuf>,

    /// Rule set to use when no strategy file is given
    #[arg(long, default_value = "baseline")]
    pub variant: StrategyVariant,

    #[arg(long, default_value = "1h")]
    pub timeframe: Timeframe,
}

#[derive(Debug, Args)]
pub struct BacktestArgs {
    #[arg(long, default_value = "BTC/USDT")]
    pub symbol: String,

    /// Number of candles fetched from Binance
    #[arg(long, default_value_t = 500)]
    pub limit: usize,

    /// Read candles from a JSON array instead of fetching them
    #[arg(long)]
    pub candles: Option<PathBuf>,

    #[arg(long, default_value_t = 1000.0)]
    pub balance: f64,

    /// Commission per side, as a fraction of notional
    #[arg(long, default_value_t = 0.0003)]
    pub commission: f64,

    /// Also print the trade journal
    #[arg(long)]
    pub trades: bool,

    #[command(flatten)]
    pub strategy: StrategyArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Bracket orders on Alpaca
    Live,
    /// Virtual wallet, long only
    Paper,
    /// Notifications only
    Signal,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Symbol to trade; repeat for several instances
    #[arg(long = "symbol", required = true)]
    pub symbols: Vec<String>,

    #[arg(long, value_enum, default_value = "signal")]
    pub mode: Mode,

    /// Seconds between polls
    #[arg(long, default_value_t = 60)]
    pub poll_interval: u64,

    /// Candles kept in each instance's window
    #[arg(long, default_value_t = 200)]
    pub window: usize,

    /// Paper wallet starting balance
    #[arg(long, default_value_t = 1000.0)]
    pub balance: f64,

    #[command(flatten)]
    pub strategy: StrategyArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtest_defaults() {
        let cli = Cli::try_parse_from(["bot", "backtest"]).unwrap();
        match cli.command {
            Command::Backtest(args) => {
                assert_eq!(args.symbol, "BTC/USDT");
                assert_eq!(args.limit, 500);
                assert_eq!(args.strategy.timeframe, Timeframe::H1);
                assert_eq!(args.strategy.variant, StrategyVariant::Baseline);
                assert!(args.candles.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_several_symbols() {
        let cli = Cli::try_parse_from([
            "bot", "--json-logs", "run", "--symbol", "BTC/USDT", "--symbol", "ETH/USDT",
            "--mode", "paper", "--timeframe", "15m", "--variant", "adx_volume",
        ])
        .unwrap();
        assert!(cli.json_logs);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.symbols, vec!["BTC/USDT", "ETH/USDT"]);
                assert_eq!(args.mode, Mode::Paper);
                assert_eq!(args.strategy.timeframe, Timeframe::M15);
                assert_eq!(args.strategy.variant, StrategyVariant::AdxVolume);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_symbol() {
        assert!(Cli::try_parse_from(["bot", "run"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_timeframe() {
        assert!(Cli::try_parse_from(["bot", "backtest", "--timeframe", "7m"]).is_err());
    }
}
