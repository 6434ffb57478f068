//! Notification sink and message formatting
//!
//! Messages are Telegram HTML; [`LogNotifier`] writes them to the log as-is.

use crate::data::Timeframe;
use crate::strategy::{Action, Decision};
use async_trait::async_trait;
use tracing::info;

/// Fire-and-forget notification channel.
///
/// Callers log failures and carry on; a failed notification never stops a
/// driver.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> anyhow::Result<()>;
}

/// Writes notifications to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) -> anyhow::Result<()> {
        info!(target: "notify", "{}", text);
        Ok(())
    }
}

/// Context shared by every message of one engine instance
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub bot_name: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub strategy: String,
    pub mode: String,
}

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Message for a forwarded decision
pub fn format_decision_message(ctx: &MessageContext, decision: &Decision) -> String {
    let header = match decision.action {
        Action::EnterLong => format!("🟢 <b>LONG - {}</b>", escape_html(&ctx.symbol)),
        Action::EnterShort => format!("🔴 <b>SHORT - {}</b>", escape_html(&ctx.symbol)),
        Action::Exit => format!("⚪ <b>EXIT - {}</b>", escape_html(&ctx.symbol)),
        Action::Hold => format!("⏳ <b>HOLD - {}</b>", escape_html(&ctx.symbol)),
    };

    let mut lines = vec![
        header,
        String::new(),
        format!("💰 <b>Price:</b> <code>{:.4}</code>", decision.price),
    ];
    if let Some(sl) = decision.stop_loss {
        lines.push(format!("🛑 <b>Stop Loss:</b> <code>{:.4}</code>", sl));
    }
    if let Some(tp) = decision.take_profit {
        lines.push(format!("🎯 <b>Take Profit:</b> <code>{:.4}</code>", tp));
    }
    if let Some(size) = decision.size {
        lines.push(format!("📦 <b>Size:</b> <code>{}</code>", size));
    }
    lines.push(format!("📝 <b>Reason:</b> {}", escape_html(&decision.reason)));
    lines.push(format!(
        "⏰ <b>Candle:</b> <code>{}</code>",
        decision.timestamp.format("%Y-%m-%d %H:%M UTC")
    ));
    lines.push(format!(
        "📈 <b>Strategy:</b> {} ({})",
        escape_html(&ctx.strategy),
        ctx.timeframe
    ));
    lines.push(String::new());
    lines.push(format!("🤖 <b>Bot:</b> {} [{}]", escape_html(&ctx.bot_name), ctx.mode));
    lines.join("\n")
}

/// Message sent once when an engine instance starts
pub fn format_started_message(ctx: &MessageContext) -> String {
    format!(
        "🤖 <b>Bot Started</b>\n\n\
📍 <b>Symbol:</b> {}\n\
📈 <b>Strategy:</b> {}\n\
⏱ <b>Timeframe:</b> {}\n\
🔄 <b>Mode:</b> <code>{}</code>\n\
🏷 <b>Bot:</b> {}",
        escape_html(&ctx.symbol),
        escape_html(&ctx.strategy),
        ctx.timeframe,
        ctx.mode,
        escape_html(&ctx.bot_name)
    )
}

/// Message for a failed execution or reconciliation step
pub fn format_error_message(ctx: &MessageContext, what: &str, error: &str) -> String {
    format!(
        "⚠️ <b>{} - {}</b>\n\n{}\n\n🤖 <b>Bot:</b> {}",
        escape_html(what),
        escape_html(&ctx.symbol),
        escape_html(error),
        escape_html(&ctx.bot_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::PositionSide;
    use chrono::Utc;

    fn ctx() -> MessageContext {
        MessageContext {
            bot_name: "trend-bot".to_string(),
            symbol: "BTC/USDT".to_string(),
            timeframe: Timeframe::H1,
            strategy: "baseline".to_string(),
            mode: "signal".to_string(),
        }
    }

    #[test]
    fn test_entry_message_lists_levels() {
        let decision = Decision::enter(PositionSide::Long, 100.0, 1.0, Utc::now(), "a < b".into())
            .with_stop_loss(96.0)
            .with_take_profit(105.2);
        let msg = format_decision_message(&ctx(), &decision);
        assert!(msg.contains("LONG - BTC/USDT"));
        assert!(msg.contains("96.0000"));
        assert!(msg.contains("105.2000"));
        assert!(msg.contains("a &lt; b"));
    }

    #[test]
    fn test_started_message() {
        let msg = format_started_message(&ctx());
        assert!(msg.contains("Bot Started"));
        assert!(msg.contains("1h"));
    }
}
