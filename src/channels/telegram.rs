//! Telegram Bot API sender.
//!
//! Posts the rendered chat text to `sendMessage` with legacy Markdown
//! parsing. Provider errors for a wrong chat id or bot token are remapped
//! to messages that name the variable to fix.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{post, Channel, Post, TELEGRAM};
use crate::config::model::TelegramSettings;
use crate::error::DeliveryError;
use crate::server::HttpClient;
use crate::submission::format::FormattedLead;

const UNKNOWN_ERROR: &str = "Unknown Telegram API error";

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramChannel {
    client: HttpClient,
    settings: TelegramSettings,
}

impl TelegramChannel {
    #[must_use]
    pub const fn new(client: HttpClient, settings: TelegramSettings) -> Self {
        Self { client, settings }
    }

    fn send_message_url(&self, token: &str) -> String {
        format!("{}/bot{token}/sendMessage", self.settings.api_base)
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn service(&self) -> &'static str {
        TELEGRAM
    }

    fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    async fn deliver(&self, lead: &FormattedLead) -> Result<(), DeliveryError> {
        let (Some(token), Some(chat_id)) = (&self.settings.bot_token, &self.settings.chat_id)
        else {
            return Err(DeliveryError::Credentials(
                "TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID are required".into(),
            ));
        };

        let body = serde_json::to_vec(&SendMessageRequest {
            chat_id,
            text: &lead.chat_text,
            parse_mode: "Markdown",
        })
        .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let url = self.send_message_url(token);
        let (status, bytes) = post(
            &self.client,
            Post {
                uri: &url,
                content_type: "application/json",
                bearer: None,
                body: Bytes::from(body),
            },
        )
        .await?;

        let parsed = serde_json::from_slice::<TelegramResponse>(&bytes).ok();
        if status.is_success() && parsed.as_ref().map_or(true, |r| r.ok) {
            return Ok(());
        }

        let description = parsed
            .and_then(|r| r.description)
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        tracing::debug!(status = status.as_u16(), description = %description, "telegram rejected message");

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            description,
        })
    }

    fn user_message(&self, error: &DeliveryError) -> String {
        match error {
            DeliveryError::Rejected { description, .. } if description.contains("chat not found") => {
                "Ошибка конфигурации: чат для уведомлений не найден. Проверьте TELEGRAM_CHAT_ID."
                    .into()
            }
            DeliveryError::Rejected {
                status,
                description,
            } if description.contains("bot token") || matches!(*status, 401 | 404) => {
                "Ошибка конфигурации: неверный токен Telegram бота. Проверьте TELEGRAM_BOT_TOKEN."
                    .into()
            }
            DeliveryError::Timeout(_) => {
                "Сервер Telegram не отвечает, попробуйте позже.".into()
            }
            other => format!("Ошибка отправки в Telegram: {}", other.detail()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::server::build_http_client;

    fn channel(token: Option<&str>, chat: Option<&str>) -> TelegramChannel {
        TelegramChannel::new(
            build_http_client(),
            TelegramSettings {
                bot_token: token.map(String::from),
                chat_id: chat.map(String::from),
                api_base: "https://api.telegram.org".into(),
            },
        )
    }

    fn rejected(status: u16, description: &str) -> DeliveryError {
        DeliveryError::Rejected {
            status,
            description: description.into(),
        }
    }

    #[test]
    fn url_embeds_token() {
        let c = channel(Some("123:ABC"), Some("42"));
        assert_eq!(
            c.send_message_url("123:ABC"),
            "https://api.telegram.org/bot123:ABC/sendMessage"
        );
    }

    #[test]
    fn configured_needs_both_values() {
        assert!(channel(Some("t"), Some("c")).is_configured());
        assert!(!channel(Some("t"), None).is_configured());
        assert!(!channel(None, Some("c")).is_configured());
    }

    #[test]
    fn chat_not_found_points_at_chat_id() {
        let msg = channel(Some("t"), Some("c"))
            .user_message(&rejected(400, "Bad Request: chat not found"));
        assert!(msg.contains("TELEGRAM_CHAT_ID"));
    }

    #[test]
    fn token_errors_point_at_token() {
        let c = channel(Some("t"), Some("c"));
        assert!(c
            .user_message(&rejected(400, "Bad Request: invalid bot token"))
            .contains("TELEGRAM_BOT_TOKEN"));
        assert!(c
            .user_message(&rejected(401, "Unauthorized"))
            .contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn other_errors_keep_provider_text() {
        let msg = channel(Some("t"), Some("c")).user_message(&rejected(
            400,
            "Bad Request: can't parse entities",
        ));
        assert_eq!(
            msg,
            "Ошибка отправки в Telegram: Bad Request: can't parse entities"
        );
    }

    #[test]
    fn timeout_message() {
        let msg = channel(Some("t"), Some("c"))
            .user_message(&DeliveryError::Timeout(Duration::from_secs(10)));
        assert_eq!(msg, "Сервер Telegram не отвечает, попробуйте позже.");
    }
}
