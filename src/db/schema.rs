//! Database schema and row types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL schema for initialization
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    content TEXT NOT NULL,
    sender TEXT NOT NULL,
    file_name TEXT,
    file_size INTEGER,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_page ON messages(page_id, created_at);
"#;

/// Message kind, as stored in the `kind` column and on the wire
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Audio,
    Image,
    File,
}

impl MessageKind {
    /// Parse a webhook reply's `type` field; anything unrecognized is text
    pub fn parse_or_text(s: &str) -> Self {
        match s {
            "audio" => MessageKind::Audio,
            "image" => MessageKind::Image,
            "file" => MessageKind::File,
            _ => MessageKind::Text,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::Audio => write!(f, "audio"),
            MessageKind::Image => write!(f, "image"),
            MessageKind::File => write!(f, "file"),
        }
    }
}

/// Message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// Message record
///
/// Field names on the wire (`type`, `fileName`, `fileSize`) match what the
/// chat UI expects. `content` is the text payload, a data URI, or the JSON
/// file envelope depending on `kind` -- the record never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub page_id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}
