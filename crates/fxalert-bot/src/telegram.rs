//! Telegram Bot API transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::TransportError;

/// Default Bot API endpoint.
pub const API_URL: &str = "https://api.telegram.org";

/// An incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    /// Message id within the chat.
    pub message_id: i64,
    /// Message text; empty for non-text messages.
    #[serde(default)]
    pub text: String,
    /// Chat the message was posted in.
    pub chat: Chat,
}

/// A chat. Alerts are stored per chat id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Chat {
    /// Chat id.
    pub id: i64,
}

/// One-time keyboard offered with an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboard {
    /// Button rows.
    pub keyboard: Vec<Vec<KeyboardButton>>,
    /// Hide the keyboard after one press.
    pub one_time_keyboard: bool,
}

impl ReplyKeyboard {
    /// Creates a one-time keyboard with one button per row.
    #[must_use]
    pub fn one_per_row(labels: impl IntoIterator<Item = String>) -> Self {
        Self {
            keyboard: labels
                .into_iter()
                .map(|text| vec![KeyboardButton { text }])
                .collect(),
            one_time_keyboard: true,
        }
    }
}

/// A keyboard button that sends its label when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    /// Button label.
    pub text: String,
}

/// Outgoing message content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Answer {
    /// Message text.
    pub text: String,
    /// Optional keyboard.
    pub keyboard: Option<ReplyKeyboard>,
}

impl Answer {
    /// Creates a plain text answer.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    /// Attaches a keyboard.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: ReplyKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Message polling and delivery.
#[async_trait]
pub trait ChatTransport: Send + Sync + std::fmt::Debug {
    /// Waits for new messages, returning an empty list on poll timeout.
    async fn poll_messages(&self) -> Result<Vec<Message>, TransportError>;

    /// Sends `answer` to `chat_id`, optionally as a reply.
    async fn send_message(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        answer: &Answer,
    ) -> Result<(), TransportError>;
}

/// Configuration for [`TelegramClient`].
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API base URL.
    pub api_url: String,
    /// Long-poll duration passed to `getUpdates`.
    pub long_poll: Duration,
    /// Timeout for `sendMessage`.
    pub send_timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            long_poll: Duration::from_secs(60),
            send_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<Option<T>, TransportError> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(TransportError::Rejected(
                self.description.unwrap_or_else(|| "response is not OK".to_string()),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a ReplyKeyboard>,
}

/// Bot API client.
///
/// Polling uses its own HTTP client whose timeout exceeds the long-poll
/// duration by five seconds. Request errors are stripped of their URL since
/// it embeds the bot token.
#[derive(Debug)]
pub struct TelegramClient {
    token: String,
    config: TelegramConfig,
    client: reqwest::Client,
    poll_client: reqwest::Client,
    last_update_id: Mutex<i64>,
}

impl TelegramClient {
    /// Creates a client for the bot `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(token: impl Into<String>, config: TelegramConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.send_timeout)
            .build()?;
        let poll_client = reqwest::Client::builder()
            .timeout(config.long_poll + Duration::from_secs(5))
            .build()?;

        Ok(Self {
            token: token.into(),
            config,
            client,
            poll_client,
            last_update_id: Mutex::new(0),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.config.api_url, self.token)
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn poll_messages(&self) -> Result<Vec<Message>, TransportError> {
        let mut last_update_id = self.last_update_id.lock().await;
        let url = format!(
            "{}?offset={}&timeout={}",
            self.method_url("getUpdates"),
            *last_update_id + 1,
            self.config.long_poll.as_secs()
        );

        let body = self
            .poll_client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;
        let updates = serde_json::from_str::<ApiResponse<Vec<Update>>>(&body)?
            .into_result()?
            .unwrap_or_default();

        if let Some(last) = updates.last() {
            *last_update_id = last.update_id;
        }
        debug!(updates = updates.len(), offset = *last_update_id, "polled updates");

        Ok(updates.into_iter().filter_map(|u| u.message).collect())
    }

    async fn send_message(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        answer: &Answer,
    ) -> Result<(), TransportError> {
        let request = SendMessage {
            chat_id,
            text: &answer.text,
            reply_to_message_id: reply_to,
            reply_markup: answer.keyboard.as_ref(),
        };

        let body = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;
        serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)?.into_result()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_updates() {
        let body = r#"{"ok":true,"result":[
            {"update_id":10,"message":{"message_id":1,"text":"/ls","chat":{"id":42},"from":{"id":42}}},
            {"update_id":11,"edited_message":{"message_id":1,"chat":{"id":42}}},
            {"update_id":12,"message":{"message_id":2,"chat":{"id":42}}}
        ]}"#;
        let updates = serde_json::from_str::<ApiResponse<Vec<Update>>>(body)
            .unwrap()
            .into_result()
            .unwrap()
            .unwrap();

        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].message.as_ref().unwrap().text, "/ls");
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 42);
        assert!(updates[1].message.is_none());
        assert_eq!(updates[2].message.as_ref().unwrap().text, "");
    }

    #[test]
    fn test_rejected_response() {
        let body = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let result = serde_json::from_str::<ApiResponse<Vec<Update>>>(body)
            .unwrap()
            .into_result();
        assert!(matches!(result, Err(TransportError::Rejected(d)) if d == "Unauthorized"));
    }

    #[test]
    fn test_send_message_encoding() {
        let keyboard = ReplyKeyboard::one_per_row(["/del EURUSD < 1.10000".to_string()]);
        let request = SendMessage {
            chat_id: 7,
            text: "Select:",
            reply_to_message_id: None,
            reply_markup: Some(&keyboard),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["chat_id"], 7);
        assert!(json.get("reply_to_message_id").is_none());
        assert_eq!(json["reply_markup"]["one_time_keyboard"], true);
        assert_eq!(
            json["reply_markup"]["keyboard"][0][0]["text"],
            "/del EURUSD < 1.10000"
        );
    }

    #[tokio::test]
    async fn test_unreachable_api() {
        let config = TelegramConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            long_poll: Duration::from_secs(1),
            send_timeout: Duration::from_secs(1),
        };
        let client = TelegramClient::new("secret-token", config).unwrap();

        let err = client.poll_messages().await.unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
        assert!(!err.to_string().contains("secret-token"));

        let err = client
            .send_message(1, None, &Answer::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
    }
}
