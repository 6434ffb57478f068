use crate::cli::{Mode, RunArgs};
use crate::commands::load_strategy;
use crate::notifier::TelegramNotifier;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use trend_engine::config::{RunnerConfig, StrategyConfig};
use trend_engine::exchange::{
    AlpacaBars, AlpacaBroker, BinanceKlines, ExecutionSink, MarketData, PaperBroker, SignalOnlySink,
};
use trend_engine::live::{EngineSupervisor, PollingDriver};
use trend_engine::notify::{LogNotifier, Notifier};

/// Paper fills go through a spot wallet, so shorts are turned off there
fn strategy_for_mode(mut strategy: StrategyConfig, mode: Mode) -> StrategyConfig {
    if mode == Mode::Paper && strategy.allow_short {
        tracing::info!("Paper mode is long only, disabling short entries");
        strategy.allow_short = false;
    }
    strategy
}

fn instance_name(runner: &RunnerConfig, strategy: &StrategyConfig) -> String {
    format!("{}:{}:{}", runner.symbol, strategy.variant, runner.timeframe)
}

pub async fn handle_run(args: RunArgs) -> Result<()> {
    let config = shared::Config::from_env()?;
    tracing::debug!("Loaded config: {:?}", config);
    let strategy = strategy_for_mode(load_strategy(&args.strategy)?, args.mode);

    let notifier: Arc<dyn Notifier> = match config.telegram() {
        Some((token, chat_id)) => Arc::new(TelegramNotifier::new(&token, chat_id)),
        None => Arc::new(LogNotifier),
    };

    // live mode reads bars from the broker's venue
    let (market, live_broker): (Arc<dyn MarketData>, Option<Arc<dyn ExecutionSink>>) = match args.mode {
        Mode::Live => {
            let (key, secret) = config.alpaca_credentials()?;
            let broker = AlpacaBroker::new(key, secret, config.alpaca_base_url.clone())?;
            let account = broker.account().await.context("reading Alpaca account")?;
            tracing::info!("Alpaca account: cash={} equity={}", account.cash, account.equity);
            let market: Arc<dyn MarketData> =
                Arc::new(AlpacaBars::new(broker.clone(), config.alpaca_data_url.clone()));
            let broker: Arc<dyn ExecutionSink> = Arc::new(broker);
            (market, Some(broker))
        }
        Mode::Paper | Mode::Signal => {
            let market: Arc<dyn MarketData> = Arc::new(BinanceKlines::new(config.binance_base_url.clone())?);
            (market, None)
        }
    };

    let supervisor = EngineSupervisor::new();
    for symbol in &args.symbols {
        let sink: Arc<dyn ExecutionSink> = match (args.mode, &live_broker) {
            (Mode::Live, Some(broker)) => broker.clone(),
            (Mode::Paper, _) => Arc::new(PaperBroker::new(args.balance)),
            _ => Arc::new(SignalOnlySink),
        };
        let runner = RunnerConfig::new(symbol.clone(), args.strategy.timeframe)
            .with_window_capacity(args.window)
            .with_poll_interval(Duration::from_secs(args.poll_interval))
            .with_starting_balance(args.balance);
        let name = instance_name(&runner, &strategy);

        let driver = PollingDriver::new(
            strategy.clone(),
            runner,
            market.clone(),
            sink,
            notifier.clone(),
            config.bot_name.clone(),
        )
        .with_context(|| format!("configuring {}", name))?;
        supervisor.start(&name, driver).await?;
    }

    for status in supervisor.status().await {
        tracing::info!(
            "Instance {} running={} started_at={}",
            status.name,
            status.running,
            status.started_at
        );
    }

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    tracing::info!("Shutting down {} instance(s)", args.symbols.len());
    supervisor.stop_all().await?;
    Ok(())
}
