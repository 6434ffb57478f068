//! Integration tests for trend-engine

use chrono::{DateTime, Duration, TimeZone, Utc};
use trend_engine::prelude::*;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

/// Deterministic series alternating trends, with some noise in the range
fn create_test_candles(count: usize, base_price: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            let close = base_price + (x / 12.0).sin() * 8.0 + (x / 3.0).cos() * 0.8;
            let open = close - (x / 2.0).sin() * 0.6;
            let high = open.max(close) + 0.4 + (x / 5.0).sin().abs() * 0.5;
            let low = open.min(close) - 0.4 - (x / 7.0).cos().abs() * 0.5;
            Candle::new(open, high, low, close, 100.0 + (x / 4.0).sin() * 40.0 + 40.0, base_time() + Duration::hours(i as i64))
        })
        .collect()
}

fn trending_candles(count: usize, step: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = 100.0 + step * i as f64 + (i as f64 / 2.0).sin() * 0.3;
            Candle::new(close - step / 2.0, close + 0.5, close - 0.5, close, 100.0, base_time() + Duration::hours(i as i64))
        })
        .collect()
}

fn replay(config: StrategyConfig, candles: &[Candle]) -> ReplayReport {
    let runner = RunnerConfig::new("BTC/USDT", Timeframe::H1)
        .with_window_capacity(100)
        .with_commission(0.0);
    ReplayDriver::new(config, runner).unwrap().run(candles).unwrap()
}

#[test]
fn test_decisions_ignore_future_candles() {
    let candles = create_test_candles(140, 100.0);
    for config in [
        StrategyConfig::default(),
        StrategyConfig::adx_volume(),
        StrategyConfig::supertrend_stoch(),
    ] {
        let full = replay(config.clone(), &candles);
        for i in (0..candles.len()).step_by(7) {
            let truncated = replay(config.clone(), &candles[..=i]);
            assert_eq!(
                truncated.decisions[i], full.decisions[i],
                "decision {} differs for {}",
                i, config.variant
            );
        }
    }
}

#[test]
fn test_warmup_only_holds() {
    for config in [
        StrategyConfig::default(),
        StrategyConfig::adx_volume(),
        StrategyConfig::supertrend_stoch(),
    ] {
        let warmup = config.warmup_len();
        for step in [1.0, -1.0] {
            let candles = trending_candles(warmup - 1, step);
            let mut engine = SignalEngine::new(config.clone()).unwrap();
            let mut window = CandleWindow::new(200).unwrap();
            for candle in candles {
                window.append(candle).unwrap();
                let decision = engine.evaluate(&window).unwrap();
                assert_eq!(decision.action, Action::Hold, "{} fired during warm-up", config.variant);
            }
            assert!(engine.position().is_flat());
        }
    }
}

fn assert_stops_monotonic(decisions: &[Decision], side: PositionSide) {
    let mut last_stop: Option<f64> = None;
    let mut checked = 0;
    for decision in decisions {
        match decision.action {
            Action::EnterLong | Action::EnterShort => {
                assert_eq!(decision.side, Some(side));
                last_stop = decision.stop_loss;
            }
            Action::Exit => last_stop = None,
            Action::Hold => {
                if let (Some(prev), Some(stop)) = (last_stop, decision.stop_loss) {
                    match side {
                        PositionSide::Long => assert!(stop >= prev, "long stop loosened {} -> {}", prev, stop),
                        PositionSide::Short => assert!(stop <= prev, "short stop loosened {} -> {}", prev, stop),
                    }
                    checked += 1;
                    last_stop = Some(stop);
                }
            }
        }
    }
    assert!(checked > 0, "no open-position bars were checked");
}

#[test]
fn test_trailing_stop_is_monotonic() {
    let up = replay(StrategyConfig::default(), &trending_candles(120, 0.4));
    assert_stops_monotonic(&up.decisions, PositionSide::Long);

    let down = replay(StrategyConfig::default(), &trending_candles(120, -0.4));
    assert_stops_monotonic(&down.decisions, PositionSide::Short);
}

#[test]
fn test_single_position_invariant() {
    let candles = create_test_candles(300, 100.0);
    for config in [
        StrategyConfig::default(),
        StrategyConfig::adx_volume(),
        StrategyConfig::supertrend_stoch(),
    ] {
        let report = replay(config, &candles);
        let mut shadow = PositionState::Flat;
        for decision in &report.decisions {
            assert!(DecisionValidator::is_legal(&shadow, decision), "illegal {:?}", decision);
            assert!(DecisionValidator::validate(decision));
            match decision.action {
                Action::EnterLong | Action::EnterShort => {
                    shadow = PositionState::Open(Position::new(
                        decision.side.unwrap(),
                        decision.price,
                        decision.stop_loss.unwrap(),
                        decision.take_profit.unwrap(),
                        decision.size.unwrap(),
                        decision.timestamp,
                    ));
                }
                Action::Exit => shadow = PositionState::Flat,
                Action::Hold => {}
            }
        }
        assert!(shadow.is_flat(), "replay must end flat");
        let entries = report.actions().filter(|d| d.action.is_entry()).count();
        assert_eq!(entries, report.result.num_trades);
    }
}

#[test]
fn test_ema_cross_entry_levels() {
    let mut machine = SignalStateMachine::new(StrategyConfig::default()).unwrap();
    let snapshot = IndicatorSnapshot {
        bars: 50,
        close: Some(100.0),
        ema_fast: Some(100.4),
        ema_slow: Some(100.1),
        rsi: Some(60.0),
        atr: Some(2.0),
        ..Default::default()
    };
    let candle = Candle::new(99.5, 100.5, 99.0, 100.0, 10.0, base_time() + Duration::hours(50));

    let decision = machine.step(&snapshot, &candle);
    assert_eq!(decision.action, Action::EnterLong);
    assert_eq!(decision.price, 100.0);
    assert!((decision.stop_loss.unwrap() - 96.0).abs() < 1e-9);
    assert!((decision.take_profit.unwrap() - 105.2).abs() < 1e-9);
    assert_eq!(machine.state().kind(), PositionKind::Long);
}

#[test]
fn test_virtual_wallet_round_trip() {
    let mut wallet = VirtualWallet::new(1000.0);
    let cost = wallet.buy(50000.0, 0.001).unwrap();
    assert!((cost - 50.0).abs() < 1e-9);
    assert!((wallet.balance - 950.0).abs() < 1e-9);
    assert!((wallet.asset_quantity - 0.001).abs() < 1e-12);

    wallet.sell_all(51000.0).unwrap();
    assert!((wallet.balance - 1001.0).abs() < 1e-9);
    assert_eq!(wallet.asset_quantity, 0.0);
}

#[test]
fn test_replay_resets_between_runs() {
    let candles = create_test_candles(200, 100.0);
    let runner = RunnerConfig::new("ETH/USDT", Timeframe::H1).with_window_capacity(100);
    let driver = ReplayDriver::new(StrategyConfig::default(), runner).unwrap();
    let first = driver.run(&candles).unwrap();
    let second = driver.run(&candles).unwrap();
    assert_eq!(first.decisions, second.decisions);
    assert_eq!(first.result.end_balance, second.result.end_balance);
    assert_eq!(first.result.start_balance, 1000.0);
}

#[test]
fn test_replay_drops_gapped_history() {
    let mut candles = create_test_candles(80, 100.0);
    // five missing bars after index 29
    for candle in candles.iter_mut().skip(30) {
        candle.timestamp = candle.timestamp + Duration::hours(5);
    }
    let report = replay(StrategyConfig::default(), &candles);
    assert_eq!(report.result.equity_curve.len(), 50);
}

#[test]
fn test_report_renders() {
    let report = replay(StrategyConfig::default(), &create_test_candles(200, 100.0));
    let text = BacktestReport::new(report.result.clone());
    let summary = text.format();
    assert!(summary.contains("Backtest Results: BTC/USDT"));
    assert!(summary.contains("Number of Trades"));
    assert_eq!(text.format_trades().lines().count(), 2 + report.result.num_trades);
}
