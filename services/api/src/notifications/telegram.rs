//! Telegram Bot API sender

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, warn};

/// Something that can deliver a finished message to the admins
///
/// Implementations report the outcome as a boolean and never fail past
/// their boundary.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, text: &str) -> bool;
}

/// Telegram configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token; sending is disabled without it
    pub bot_token: Option<String>,
    /// Target chat id; sending is disabled without it
    pub chat_id: Option<String>,
    /// Bot API base URL
    pub api_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl TelegramConfig {
    /// Create a new TelegramConfig from environment variables
    ///
    /// # Environment Variables
    /// - `TELEGRAM_BOT_TOKEN`: Bot token
    /// - `TELEGRAM_CHAT_ID`: Admin chat id (falls back to `TELEGRAM_ADMIN_CHAT_ID`)
    /// - `TELEGRAM_API_URL`: Bot API base URL (default: "https://api.telegram.org")
    /// - `TELEGRAM_TIMEOUT_SECONDS`: Request timeout (default: 10)
    pub fn from_env() -> Self {
        let api_url = non_empty_var("TELEGRAM_API_URL")
            .unwrap_or_else(|| "https://api.telegram.org".to_string());
        let timeout = non_empty_var("TELEGRAM_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self {
            bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            chat_id: non_empty_var("TELEGRAM_CHAT_ID")
                .or_else(|| non_empty_var("TELEGRAM_ADMIN_CHAT_ID")),
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Client for the `sendMessage` method
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        if !config.is_configured() {
            warn!("Telegram bot token or chat id not set, admin notifications are disabled");
        }
        Ok(Self { http, config })
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, text: &str) -> bool {
        let (Some(token), Some(chat_id)) = (&self.config.bot_token, &self.config.chat_id) else {
            warn!("Telegram configuration not found, skipping notification");
            return false;
        };

        let url = format!("{}/bot{}/sendMessage", self.config.api_url, token);
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
        };

        match self.http.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Telegram notification sent");
                true
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!(%status, "Telegram rejected notification: {}", body);
                false
            }
            Err(e) => {
                // the URL embeds the bot token
                error!("Failed to send Telegram notification: {}", e.without_url());
                false
            }
        }
    }
}
