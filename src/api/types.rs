//! API response types

use crate::config::PageConfig;
use crate::db::Message;
use serde::Serialize;

/// Response with the configured page list
#[derive(Debug, Serialize)]
pub struct PagesResponse {
    pub pages: Vec<PageConfig>,
}

/// Response with a page's message thread
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
