use anyhow::Context;
use dotenv::dotenv;

pub const DEFAULT_ALPACA_BASE_URL: &str = "https://paper-api.alpaca.markets";
pub const DEFAULT_ALPACA_DATA_URL: &str = "https://data.alpaca.markets";
pub const DEFAULT_BINANCE_BASE_URL: &str = "https://api.binance.com";

/// Runtime settings read from the environment (and `.env`, when present)
#[derive(Clone)]
pub struct Config {
    pub alpaca_api_key: Option<String>,
    pub alpaca_secret_key: Option<String>,
    pub alpaca_base_url: String,
    pub alpaca_data_url: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub binance_base_url: String,
    pub bot_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let telegram_chat_id = match get("TELEGRAM_CHAT_ID") {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .with_context(|| format!("TELEGRAM_CHAT_ID is not a number: {}", raw))?,
            ),
            None => None,
        };

        Ok(Config {
            alpaca_api_key: get("ALPACA_API_KEY"),
            alpaca_secret_key: get("ALPACA_SECRET_KEY"),
            alpaca_base_url: get("ALPACA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ALPACA_BASE_URL.to_string()),
            alpaca_data_url: get("ALPACA_DATA_URL")
                .unwrap_or_else(|| DEFAULT_ALPACA_DATA_URL.to_string()),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id,
            binance_base_url: get("BINANCE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BINANCE_BASE_URL.to_string()),
            bot_name: get("BOT_NAME").unwrap_or_else(|| "WiseTrader".to_string()),
        })
    }

    /// Alpaca credentials, required for live trading
    pub fn alpaca_credentials(&self) -> Result<(String, String), anyhow::Error> {
        match (&self.alpaca_api_key, &self.alpaca_secret_key) {
            (Some(key), Some(secret)) => Ok((key.clone(), secret.clone())),
            _ => anyhow::bail!("ALPACA_API_KEY and ALPACA_SECRET_KEY must be set for live trading"),
        }
    }

    /// Telegram bot token and chat, when both are configured
    pub fn telegram(&self) -> Option<(String, i64)> {
        match (&self.telegram_bot_token, self.telegram_chat_id) {
            (Some(token), Some(chat)) => Some((token.clone(), chat)),
            _ => {
                tracing::debug!("Telegram not configured, notifications go to the log");
                None
            }
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Config")
            .field("alpaca_api_key", &redact(&self.alpaca_api_key))
            .field("alpaca_secret_key", &redact(&self.alpaca_secret_key))
            .field("alpaca_base_url", &self.alpaca_base_url)
            .field("alpaca_data_url", &self.alpaca_data_url)
            .field("telegram_bot_token", &redact(&self.telegram_bot_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("binance_base_url", &self.binance_base_url)
            .field("bot_name", &self.bot_name)
            .finish()
    }
}
