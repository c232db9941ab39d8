//! Telegram alert sink.
//!
//! Uses teloxide `Bot` directly (send-only, no dispatcher).

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

use super::{NotificationSink, NotifyError};

/// Sends lead alerts to a single operator chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    /// Create a notifier for `chat_id` using `bot_token`.
    pub fn new(bot_token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(bot_token),
            chat_id: ChatId(chat_id),
        }
    }

    /// The chat alerts are sent to.
    pub fn chat_id(&self) -> i64 {
        self.chat_id.0
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        debug!(chat_id = self.chat_id.0, "telegram alert sent");
        Ok(())
    }
}
