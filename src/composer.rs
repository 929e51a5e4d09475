//! Message normalization
//!
//! Turns raw composer input (typed text, a recorded audio reference, a
//! picked image, a picked file) into the `(content, kind)` pair the
//! conversation engine sends. One attachment per message; the engine never
//! looks inside the produced content.

use crate::db::MessageKind;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Empty message")]
    Empty,
    #[error("Not an image: {0}")]
    NotAnImage(String),
    #[error("Invalid base64 payload")]
    InvalidPayload,
}

/// Raw input as posted by the composer UI
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInput {
    Text {
        text: String,
    },
    /// A capture session's playable reference
    Audio {
        url: String,
    },
    /// Picked or camera-captured image, base64-encoded
    Image {
        media_type: String,
        data: String,
    },
    /// Any other picked file, base64-encoded
    File {
        name: String,
        media_type: String,
        data: String,
    },
}

/// Normalized message content, ready for the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub content: String,
    pub kind: MessageKind,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
}

impl Draft {
    fn plain(content: String, kind: MessageKind) -> Self {
        Self {
            content,
            kind,
            file_name: None,
            file_size: None,
        }
    }
}

/// JSON envelope for generic file attachments.
///
/// The envelope is the message content verbatim; only the presentation
/// layer parses it back.
#[derive(Debug, Serialize, Deserialize)]
struct FileEnvelope {
    name: String,
    #[serde(rename = "type")]
    media_type: String,
    size: i64,
    data: String,
}

/// Normalize raw input into a sendable draft
pub fn normalize(input: RawInput) -> Result<Draft, ComposeError> {
    match input {
        RawInput::Text { text } => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ComposeError::Empty);
            }
            Ok(Draft::plain(trimmed.to_string(), MessageKind::Text))
        }
        RawInput::Audio { url } => {
            if url.is_empty() {
                return Err(ComposeError::Empty);
            }
            Ok(Draft::plain(url, MessageKind::Audio))
        }
        RawInput::Image { media_type, data } => {
            if !media_type.starts_with("image/") {
                return Err(ComposeError::NotAnImage(media_type));
            }
            BASE64
                .decode(&data)
                .map_err(|_| ComposeError::InvalidPayload)?;
            Ok(Draft::plain(data_uri(&media_type, &data), MessageKind::Image))
        }
        RawInput::File {
            name,
            media_type,
            data,
        } => {
            let bytes = BASE64
                .decode(&data)
                .map_err(|_| ComposeError::InvalidPayload)?;
            let size = bytes.len() as i64;
            let envelope = FileEnvelope {
                name: name.clone(),
                media_type: media_type.clone(),
                size,
                data: data_uri(&media_type, &data),
            };
            let content =
                serde_json::to_string(&envelope).map_err(|_| ComposeError::InvalidPayload)?;
            Ok(Draft {
                content,
                kind: MessageKind::File,
                file_name: Some(name),
                file_size: Some(size),
            })
        }
    }
}

fn data_uri(media_type: &str, data: &str) -> String {
    format!("data:{media_type};base64,{data}")
}
