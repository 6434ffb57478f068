use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use trend_engine::notify::Notifier;

/// Sends engine messages to one Telegram chat
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> anyhow::Result<()> {
        self.bot
            .send_message(self.chat_id, text.to_string())
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}
