//! Webhook relay client
//!
//! Each page is answered by an external HTTP endpoint: the user message is
//! POSTed as JSON and the reply body (optional `type`, optional `content`
//! or `message`) becomes the bot message. Any 2xx with a parseable JSON
//! body counts as success; everything else is a `RelayError`.

use crate::db::MessageKind;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Canned acknowledgement when the reply carries no text at all
pub const DEFAULT_ACK: &str = "تم استلام رسالتك";

/// Relay request timeout. The upstream webhooks are automation flows that
/// either answer quickly or not at all; without this a hung endpoint would
/// hold the page busy forever.
const RELAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Relay error, classified for logging only -- every failure surfaces to
/// the user as the same canned reply.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RelayError {
    pub kind: RelayErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    /// Connection failure or timeout
    Network,
    /// Non-2xx status
    Http,
    /// 2xx with an unparseable body
    MalformedReply,
}

impl RelayError {
    fn new(kind: RelayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Network, message)
    }

    pub fn http(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Http, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::MalformedReply, message)
    }
}

/// Outbound webhook body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    #[serde(rename = "pageId")]
    pub page_id: String,
}

impl WebhookPayload {
    pub fn new(content: &str, kind: MessageKind, page_id: &str) -> Self {
        Self {
            message: content.to_string(),
            kind: kind.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            page_id: page_id.to_string(),
        }
    }
}

/// Interpreted bot reply
#[derive(Debug, Clone, PartialEq)]
pub struct BotReply {
    pub kind: MessageKind,
    pub content: String,
}

/// Raw reply body; every field is optional
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(rename = "type")]
    kind: Option<String>,
    content: Option<String>,
    message: Option<String>,
}

impl RawReply {
    fn interpret(self) -> BotReply {
        BotReply {
            kind: self
                .kind
                .map_or(MessageKind::Text, |k| MessageKind::parse_or_text(&k)),
            content: self
                .content
                .or(self.message)
                .unwrap_or_else(|| DEFAULT_ACK.to_string()),
        }
    }
}

/// HTTP client for webhook delivery
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(RELAY_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// POST the payload and interpret the JSON reply
    pub async fn deliver(&self, url: &str, payload: &WebhookPayload) -> Result<BotReply, RelayError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    RelayError::network(format!("Connection failed: {e}"))
                } else {
                    RelayError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::network(format!("Failed to read reply: {e}")))?;

        if !status.is_success() {
            return Err(RelayError::http(format!("HTTP {status}: {body}")));
        }

        let raw: RawReply = serde_json::from_str(&body)
            .map_err(|e| RelayError::malformed(format!("Invalid reply body: {e}")))?;

        Ok(raw.interpret())
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}
