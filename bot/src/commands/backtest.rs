use crate::cli::BacktestArgs;
use crate::commands::load_strategy;
use anyhow::{Context, Result};
use std::path::Path;
use trend_engine::backtest::{BacktestReport, ReplayDriver};
use trend_engine::config::RunnerConfig;
use trend_engine::data::Candle;
use trend_engine::exchange::{BinanceKlines, MarketData};

fn read_candles(path: &Path) -> Result<Vec<Candle>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("cannot parse candles in {}", path.display()))
}

pub async fn handle_backtest(args: BacktestArgs) -> Result<()> {
    let config = shared::Config::from_env()?;
    let strategy = load_strategy(&args.strategy)?;
    let timeframe = args.strategy.timeframe;

    let candles = match &args.candles {
        Some(path) => read_candles(path)?,
        None => {
            let market = BinanceKlines::new(config.binance_base_url.clone())?;
            market
                .get_window(&args.symbol, timeframe, args.limit)
                .await
                .with_context(|| format!("fetching {} {} candles", args.symbol, timeframe))?
        }
    };
    tracing::info!(
        "Backtesting {} {} ({}) over {} candles",
        args.symbol,
        timeframe,
        strategy.variant,
        candles.len()
    );

    let runner = RunnerConfig::new(args.symbol.clone(), timeframe)
        .with_starting_balance(args.balance)
        .with_commission(args.commission);
    let report = ReplayDriver::new(strategy, runner)?.run(&candles)?;

    let report = BacktestReport::new(report.result);
    println!("{}", report.format());
    if args.trades {
        println!("{}", report.format_trades());
    }
    Ok(())
}
