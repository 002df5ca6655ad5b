//! Telegram Bot API client
//!
//! Only the two outbound calls this bot makes: `sendMessage` and `sendPhoto`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::error;

use crate::errors::BotError;

/// Outbound replies to a chat.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_text_message(&self, chat_id: i64, text: &str) -> Result<(), BotError>;

    /// `photo` is any URL Telegram can fetch on its own.
    async fn send_photo(&self, chat_id: i64, photo: &str, caption: &str) -> Result<(), BotError>;
}

#[must_use]
pub fn build_text_payload(chat_id: i64, text: &str) -> Value {
    json!({ "chat_id": chat_id, "text": text })
}

#[must_use]
pub fn build_photo_payload(chat_id: i64, photo: &str, caption: &str) -> Value {
    json!({ "chat_id": chat_id, "photo": photo, "caption": caption })
}

pub struct TelegramClient {
    http: Client,
    token: String,
    base_url: String,
}

impl TelegramClient {
    #[must_use]
    pub fn new(http: Client, token: String, base_url: &str) -> Self {
        Self {
            http,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn post(&self, method: &str, payload: &Value) -> Result<(), BotError> {
        let resp = self
            .http
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            error!("Telegram {} failed: status={} body={}", method, status, body);
            return Err(BotError::TelegramApi {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ChatSender for TelegramClient {
    async fn send_text_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        self.post("sendMessage", &build_text_payload(chat_id, text))
            .await
    }

    async fn send_photo(&self, chat_id: i64, photo: &str, caption: &str) -> Result<(), BotError> {
        self.post("sendPhoto", &build_photo_payload(chat_id, photo, caption))
            .await
    }
}
