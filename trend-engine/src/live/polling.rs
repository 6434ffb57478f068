//! Polling driver
//!
//! Fetches the newest candles on a fixed wall-clock cadence and runs the
//! engine on every candle it has not seen yet. The window, engine state and
//! dedup key are owned by the driver instance, so drivers for different
//! symbols share nothing.

use crate::config::{RunnerConfig, StrategyConfig};
use crate::data::{sanitize, Candle, CandleWindow};
use crate::engine::SignalEngine;
use crate::error::Result;
use crate::exchange::{ExecutionSink, MarketData};
use crate::notify::{
    format_decision_message, format_error_message, format_started_message, MessageContext, Notifier,
};
use crate::portfolio::{PositionKind, PositionSide};
use crate::strategy::{Action, Decision};
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Dedup key of the last forwarded decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SignalKey {
    position: PositionKind,
    direction: Option<PositionSide>,
}

/// Live / paper / signal-only driver for one symbol
pub struct PollingDriver {
    runner: RunnerConfig,
    engine: SignalEngine,
    window: CandleWindow,
    market: Arc<dyn MarketData>,
    sink: Arc<dyn ExecutionSink>,
    notifier: Arc<dyn Notifier>,
    context: MessageContext,
    last_forwarded: Option<SignalKey>,
}

impl PollingDriver {
    /// Create new polling driver; fails with `ConfigInvalid` on bad settings
    pub fn new(
        strategy: StrategyConfig,
        runner: RunnerConfig,
        market: Arc<dyn MarketData>,
        sink: Arc<dyn ExecutionSink>,
        notifier: Arc<dyn Notifier>,
        bot_name: impl Into<String>,
    ) -> Result<Self> {
        strategy.validate()?;
        runner.validate(&strategy)?;
        let context = MessageContext {
            bot_name: bot_name.into(),
            symbol: runner.symbol.clone(),
            timeframe: runner.timeframe,
            strategy: strategy.variant.to_string(),
            mode: sink.name().to_string(),
        };
        Ok(Self {
            window: CandleWindow::new(runner.window_capacity)?,
            engine: SignalEngine::new(strategy)?,
            runner,
            market,
            sink,
            notifier,
            context,
            last_forwarded: None,
        })
    }

    pub fn runner(&self) -> &RunnerConfig {
        &self.runner
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn window(&self) -> &CandleWindow {
        &self.window
    }

    /// Poll until `cancel` fires.
    ///
    /// Cancellation is checked at the top of every cycle and while sleeping.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Polling {} every {:?} ({} via {})",
            self.runner.symbol,
            self.runner.poll_interval,
            self.context.strategy,
            self.sink.name()
        );
        self.send(format_started_message(&self.context)).await;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let decision = self.poll_once().await;
            debug!("{} cycle: {} ({})", self.runner.symbol, decision.action, decision.reason);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.runner.poll_interval) => {}
            }
        }

        info!("Polling driver for {} stopped", self.runner.symbol);
    }

    /// Run one fetch/evaluate/forward cycle.
    ///
    /// Every failure degrades to HOLD. When several new candles arrived the
    /// engine steps through each of them; the last non-HOLD decision is
    /// returned, or the final HOLD.
    pub async fn poll_once(&mut self) -> Decision {
        let fetched = match self
            .market
            .get_window(&self.runner.symbol, self.runner.timeframe, self.runner.window_capacity)
            .await
        {
            Ok(candles) => candles,
            Err(e) => {
                warn!("Market data fetch failed for {}: {}", self.runner.symbol, e);
                return self.hold(format!("fetch failed: {}", e));
            }
        };

        let candles = sanitize(fetched, self.runner.timeframe, self.runner.max_missing_bars);
        let Some(newest) = candles.last().map(|c| c.timestamp) else {
            warn!("No usable candles for {}", self.runner.symbol);
            return self.hold("no usable candles".to_string());
        };

        let last_seen = self.window.latest().map(|c| c.timestamp);
        if last_seen.map_or(false, |t| newest <= t) {
            return self.hold("no new candle".to_string());
        }

        let fresh: Vec<Candle> = if self.continues_window(&candles) {
            candles
                .into_iter()
                .filter(|c| last_seen.map_or(true, |t| c.timestamp > t))
                .collect()
        } else {
            match self.bootstrap(candles) {
                Ok(last) => vec![last],
                Err(e) => {
                    warn!("Failed to rebuild window for {}: {}", self.runner.symbol, e);
                    return self.hold(e.to_string());
                }
            }
        };

        self.reconcile().await;

        let mut outcome = None;
        for candle in fresh {
            if let Err(e) = self.window.append(candle) {
                warn!("Skipping candle: {}", e);
                continue;
            }
            let decision = match self.engine.evaluate(&self.window) {
                Ok(decision) => decision,
                Err(e) => {
                    warn!("Evaluation failed for {}: {}", self.runner.symbol, e);
                    self.hold(e.to_string())
                }
            };
            if !decision.is_hold() {
                self.forward(&decision).await;
                outcome = Some(decision);
            } else if outcome.as_ref().map_or(true, |d: &Decision| d.is_hold()) {
                outcome = Some(decision);
            }
        }

        outcome.unwrap_or_else(|| self.hold("no new candle".to_string()))
    }

    /// Whether `candles` pick up where the window left off
    fn continues_window(&self, candles: &[Candle]) -> bool {
        let Some(last) = self.window.latest() else {
            return false;
        };
        let max_spacing = self.runner.timeframe.seconds() * (i64::from(self.runner.max_missing_bars) + 1);
        candles
            .iter()
            .find(|c| c.timestamp > last.timestamp)
            .map_or(false, |c| (c.timestamp - last.timestamp).num_seconds() <= max_spacing)
    }

    /// Refill the window with history, returning the newest candle unappended
    fn bootstrap(&mut self, mut candles: Vec<Candle>) -> Result<Candle> {
        let newest = candles
            .pop()
            .ok_or_else(|| crate::EngineError::DataUnavailable("empty fetch".to_string()))?;
        debug!("Loading {} history candles for {}", candles.len(), self.runner.symbol);
        self.window = CandleWindow::from_candles(self.runner.window_capacity, candles)?;
        Ok(newest)
    }

    /// Align the engine with the broker before deciding.
    ///
    /// A position the broker no longer holds (a bracket leg filled
    /// broker-side) forces the engine FLAT.
    async fn reconcile(&mut self) {
        if !self.sink.tracks_positions() || self.engine.position().is_flat() {
            return;
        }
        match self.sink.get_open_quantity(&self.runner.symbol).await {
            Ok(qty) if qty.abs() < f64::EPSILON => {
                if let Some(position) = self.engine.force_flat() {
                    warn!(
                        "Broker holds no {} position on {}; engine forced flat",
                        position.side, self.runner.symbol
                    );
                    self.last_forwarded = Some(SignalKey {
                        position: PositionKind::Flat,
                        direction: Some(position.side),
                    });
                    let msg = format_error_message(
                        &self.context,
                        "Position closed by broker",
                        &format!("{} position from {:.4} is no longer open", position.side, position.entry_price),
                    );
                    self.send(msg).await;
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Reconciliation read failed for {}: {}", self.runner.symbol, e),
        }
    }

    /// Send a non-HOLD decision to the sink and notifier exactly once
    async fn forward(&mut self, decision: &Decision) {
        let key = SignalKey {
            position: self.engine.position().kind(),
            direction: decision.side,
        };
        if self.last_forwarded == Some(key) {
            debug!("Duplicate {} for {}, not forwarded", decision.action, self.runner.symbol);
            return;
        }
        self.last_forwarded = Some(key);
        info!(
            "{} {} @ {:.4} ({})",
            decision.action, self.runner.symbol, decision.price, decision.reason
        );

        let symbol = self.runner.symbol.clone();
        match decision.action {
            Action::EnterLong | Action::EnterShort => {
                let Some(side) = decision.side else {
                    return;
                };
                if self.sink.tracks_positions() && !self.prepare_entry(side, decision.price).await {
                    self.send(format_decision_message(&self.context, decision)).await;
                    return;
                }
                let result = self
                    .sink
                    .place_entry(
                        &symbol,
                        side,
                        decision.price,
                        decision.size.unwrap_or(self.engine.config().order_size),
                        decision.stop_loss.unwrap_or(decision.price),
                        decision.take_profit.unwrap_or(decision.price),
                    )
                    .await;
                match result {
                    Ok(order) => debug!("Order {} accepted for {}", order.id, symbol),
                    Err(e) => {
                        error!("Entry on {} failed: {}", symbol, e);
                        self.send(format_error_message(&self.context, "Order failed", &e.to_string()))
                            .await;
                    }
                }
            }
            Action::Exit => {
                if let Err(e) = self.sink.close_position(&symbol, decision.price).await {
                    error!("Close on {} failed: {}", symbol, e);
                    self.send(format_error_message(&self.context, "Close failed", &e.to_string()))
                        .await;
                }
            }
            Action::Hold => return,
        }

        self.send(format_decision_message(&self.context, decision)).await;
    }

    /// Read broker quantity before an entry: close an opposite position,
    /// and report `false` when the same side is already open.
    async fn prepare_entry(&self, side: PositionSide, price: f64) -> bool {
        let symbol = &self.runner.symbol;
        let qty = match self.sink.get_open_quantity(symbol).await {
            Ok(qty) => qty,
            Err(e) => {
                warn!("Reconciliation read failed for {}: {}", symbol, e);
                return true;
            }
        };
        if qty * side.sign() > 0.0 {
            info!("Broker already holds {} {} on {}, not resubmitting", qty, side, symbol);
            return false;
        }
        if qty.abs() > f64::EPSILON {
            info!("Closing opposite broker position ({}) on {} before {} entry", qty, symbol, side);
            if let Err(e) = self.sink.close_position(symbol, price).await {
                error!("Close before reversal on {} failed: {}", symbol, e);
                self.send(format_error_message(&self.context, "Close failed", &e.to_string()))
                    .await;
            }
        }
        true
    }

    async fn send(&self, text: String) {
        if let Err(e) = self.notifier.notify(&text).await {
            warn!("Notification failed: {}", e);
        }
    }

    fn hold(&self, reason: String) -> Decision {
        match self.window.latest() {
            Some(candle) => Decision::hold(candle.close, candle.timestamp, reason),
            None => Decision::hold(0.0, Utc::now(), reason),
        }
    }
}

impl std::fmt::Debug for PollingDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingDriver")
            .field("symbol", &self.runner.symbol)
            .field("timeframe", &self.runner.timeframe)
            .field("sink", &self.sink.name())
            .field("position", self.engine.position())
            .finish()
    }
}
