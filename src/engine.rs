//! Conversation engine
//!
//! Orchestrates the message exchange for one page at a time: optimistic
//! local append of the user message, best-effort persistence, webhook
//! round-trip, and append of the bot reply (or a canned failure reply).
//!
//! Persistence failures are logged and swallowed -- the optimistic copy
//! stays in the thread. Relay failures of every flavor (network, non-2xx,
//! malformed body) collapse into one fixed user-visible reply; only the
//! logs tell them apart.

pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::{DatabaseStore, MessageStore, WebhookRelay};

use crate::composer::Draft;
use crate::config::PageConfig;
use crate::db::{Message, MessageKind, Sender};
use crate::relay::{BotReply, WebhookClient, WebhookPayload};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use thiserror::Error;

/// Fixed reply shown when the webhook round-trip fails
pub const RELAY_FAILURE_REPLY: &str =
    "عذراً، حدث خطأ في الإرسال. تأكد من إعداد webhook بشكل صحيح.";

/// Type alias for the engine with production adapters
pub type ProductionEngine = ConversationEngine<DatabaseStore, WebhookClient>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("A send is already in flight for this page")]
    Busy,
}

/// A completed user/bot exchange, in append order
#[derive(Debug, Clone, serde::Serialize)]
pub struct Exchange {
    pub user: Message,
    pub bot: Message,
}

/// Per-page conversation engine.
///
/// One logical writer per page: a busy flag rejects concurrent sends
/// instead of queueing them. The in-memory thread is the UI-visible truth;
/// the store is refreshed from it best-effort and re-read in full on every
/// history load.
pub struct ConversationEngine<S, R> {
    store: S,
    relay: R,
    threads: Mutex<HashMap<String, Vec<Message>>>,
    busy: Mutex<HashSet<String>>,
}

impl<S: MessageStore, R: WebhookRelay> ConversationEngine<S, R> {
    pub fn new(store: S, relay: R) -> Self {
        Self {
            store,
            relay,
            threads: Mutex::new(HashMap::new()),
            busy: Mutex::new(HashSet::new()),
        }
    }

    /// Reload a page's thread from the store.
    ///
    /// Fails soft: on a store error the thread is substituted with an empty
    /// one and the error only logged. Always a full re-read, never served
    /// from the in-memory copy.
    pub async fn load_history(&self, page_id: &str) -> Vec<Message> {
        let thread = match self.store.history(page_id).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(page_id = %page_id, error = %e, "Failed to load history");
                Vec::new()
            }
        };
        self.threads
            .lock()
            .unwrap()
            .insert(page_id.to_string(), thread.clone());
        thread
    }

    /// Send a normalized draft on one page and wait for the exchange.
    ///
    /// Rejected with `EngineError::Busy` while a send is in flight for the
    /// same page; nothing is appended and the relay is not called.
    pub async fn send(&self, page: &PageConfig, draft: Draft) -> Result<Exchange, EngineError> {
        {
            let mut busy = self.busy.lock().unwrap();
            if !busy.insert(page.id.clone()) {
                return Err(EngineError::Busy);
            }
        }

        let exchange = self.exchange(page, draft).await;

        // Busy clears on success and failure alike
        self.busy.lock().unwrap().remove(&page.id);
        Ok(exchange)
    }

    async fn exchange(&self, page: &PageConfig, draft: Draft) -> Exchange {
        let user = Message {
            id: uuid::Uuid::new_v4().to_string(),
            page_id: page.id.clone(),
            kind: draft.kind,
            content: draft.content,
            sender: Sender::User,
            timestamp: Utc::now(),
            file_name: draft.file_name,
            file_size: draft.file_size,
        };

        // Optimistic append: visible before the durable write resolves
        self.append(user.clone());
        self.persist(&user).await;

        let payload = WebhookPayload::new(&user.content, user.kind, &page.id);
        let reply = match self.relay.deliver(&page.webhook_url, &payload).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    page_id = %page.id,
                    kind = ?e.kind,
                    error = %e,
                    "Webhook relay failed"
                );
                BotReply {
                    kind: MessageKind::Text,
                    content: RELAY_FAILURE_REPLY.to_string(),
                }
            }
        };

        let bot = Message {
            id: uuid::Uuid::new_v4().to_string(),
            page_id: page.id.clone(),
            kind: reply.kind,
            content: reply.content,
            sender: Sender::Bot,
            timestamp: Utc::now(),
            file_name: None,
            file_size: None,
        };

        self.append(bot.clone());
        self.persist(&bot).await;

        Exchange { user, bot }
    }

    fn append(&self, message: Message) {
        self.threads
            .lock()
            .unwrap()
            .entry(message.page_id.clone())
            .or_default()
            .push(message);
    }

    /// Best-effort durable write; failure is logged, never surfaced
    async fn persist(&self, message: &Message) {
        if let Err(e) = self.store.insert(message).await {
            tracing::error!(
                page_id = %message.page_id,
                message_id = %message.id,
                error = %e,
                "Failed to persist message"
            );
        }
    }

    /// Current in-memory thread for a page
    #[allow(dead_code)] // Used in tests
    pub fn thread(&self, page_id: &str) -> Vec<Message> {
        self.threads
            .lock()
            .unwrap()
            .get(page_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether a send is in flight for a page
    #[allow(dead_code)] // Used in tests
    pub fn is_busy(&self, page_id: &str) -> bool {
        self.busy.lock().unwrap().contains(page_id)
    }
}
