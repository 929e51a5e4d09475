//! Mock implementations for testing
//!
//! These mocks enable engine tests without real I/O.

use super::traits::{MessageStore, WebhookRelay};
use crate::db::Message;
use crate::relay::{BotReply, RelayError, WebhookPayload};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Message Store
// ============================================================================

/// In-memory store with switchable read/write failure
#[derive(Default)]
pub struct MockStore {
    rows: Mutex<Vec<Message>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// All rows ever written, across pages
    pub fn rows(&self) -> Vec<Message> {
        self.rows.lock().unwrap().clone()
    }

    /// Seed a row directly, bypassing the engine
    pub fn seed(&self, message: Message) {
        self.rows.lock().unwrap().push(message);
    }
}

#[async_trait]
impl MessageStore for MockStore {
    async fn insert(&self, message: &Message) -> Result<(), String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("simulated write failure".to_string());
        }
        self.rows.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn history(&self, page_id: &str) -> Result<Vec<Message>, String> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err("simulated read failure".to_string());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.page_id == page_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Mock Webhook Relay
// ============================================================================

/// Relay that returns queued replies and records every delivery
#[derive(Default)]
pub struct MockRelay {
    replies: Mutex<VecDeque<Result<BotReply, RelayError>>>,
    deliveries: Mutex<Vec<(String, WebhookPayload)>>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: BotReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    /// Queue a relay failure
    pub fn queue_error(&self, error: RelayError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Make the next delivery block until the returned handle is notified
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    /// Recorded `(url, payload)` deliveries
    pub fn deliveries(&self) -> Vec<(String, WebhookPayload)> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookRelay for MockRelay {
    async fn deliver(
        &self,
        url: &str,
        payload: &WebhookPayload,
    ) -> Result<BotReply, RelayError> {
        self.deliveries
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));

        let gate = self.hold.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RelayError::network("No mock reply queued")))
    }
}
