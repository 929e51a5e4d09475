//! Trait abstractions for engine I/O
//!
//! These traits enable testing the engine with mock implementations.

use crate::db::{Database, Message};
use crate::relay::{BotReply, RelayError, WebhookClient, WebhookPayload};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable storage for message threads
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append one message to its page's thread
    async fn insert(&self, message: &Message) -> Result<(), String>;

    /// Load a page's thread, ascending by creation time
    async fn history(&self, page_id: &str) -> Result<Vec<Message>, String>;
}

/// Delivery of a user message to a page's webhook
#[async_trait]
pub trait WebhookRelay: Send + Sync {
    async fn deliver(&self, url: &str, payload: &WebhookPayload)
        -> Result<BotReply, RelayError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: MessageStore + ?Sized> MessageStore for Arc<T> {
    async fn insert(&self, message: &Message) -> Result<(), String> {
        (**self).insert(message).await
    }

    async fn history(&self, page_id: &str) -> Result<Vec<Message>, String> {
        (**self).history(page_id).await
    }
}

#[async_trait]
impl<T: WebhookRelay + ?Sized> WebhookRelay for Arc<T> {
    async fn deliver(
        &self,
        url: &str,
        payload: &WebhookPayload,
    ) -> Result<BotReply, RelayError> {
        (**self).deliver(url, payload).await
    }
}

// ============================================================================
// Production adapters
// ============================================================================

/// SQLite-backed message store
#[derive(Clone)]
pub struct DatabaseStore {
    db: Database,
}

impl DatabaseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MessageStore for DatabaseStore {
    async fn insert(&self, message: &Message) -> Result<(), String> {
        self.db.insert_message(message).map_err(|e| e.to_string())
    }

    async fn history(&self, page_id: &str) -> Result<Vec<Message>, String> {
        self.db
            .messages_for_page(page_id)
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl WebhookRelay for WebhookClient {
    async fn deliver(
        &self,
        url: &str,
        payload: &WebhookPayload,
    ) -> Result<BotReply, RelayError> {
        WebhookClient::deliver(self, url, payload).await
    }
}
