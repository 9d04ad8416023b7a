use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::app_config::TelegramConfig;
use crate::trading::notification::Notifier;
use crate::trading::upbit::upbit_client::truncate;

const TELEGRAM_API: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram Bot 通知服务
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: TELEGRAM_API.to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// 纯文本发送，不启用 parse_mode，币种名里的特殊字符不会破坏消息
    async fn send_message(&self, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
        };

        let response = self
            .client
            .post(self.send_url())
            .json(&request)
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;

        if response.status().is_success() {
            info!("📨 Telegram message sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow::anyhow!(
                "Telegram API error: HTTP {} - {}",
                status,
                truncate(&body, 200)
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_url() {
        let notifier = TelegramNotifier::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: "42".to_string(),
        });
        assert_eq!(
            notifier.send_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(SendMessageRequest {
            chat_id: "42",
            text: "🟢 시작",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"chat_id": "42", "text": "🟢 시작"}));
    }
}
