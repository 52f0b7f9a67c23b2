//! In-memory sync queue for tests/dev.

use std::sync::Mutex;

use crate::sync_queue::{SyncIntent, SyncMessage, SyncQueue, SyncQueueError};

/// In-memory sync queue.
///
/// - No IO / no async
/// - Keeps every message in enqueue order until drained
#[derive(Debug, Default)]
pub struct InMemorySyncQueue {
    messages: Mutex<Vec<SyncMessage>>,
}

impl InMemorySyncQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all queued messages.
    pub fn messages(&self) -> Vec<SyncMessage> {
        match self.messages.lock() {
            Ok(m) => m.clone(),
            Err(_) => vec![],
        }
    }

    /// Remove and return all queued messages.
    pub fn drain(&self) -> Vec<SyncMessage> {
        match self.messages.lock() {
            Ok(mut m) => std::mem::take(&mut *m),
            Err(_) => vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of queued messages with the given intent, in enqueue order.
    pub fn keys_with_intent(&self, intent: SyncIntent) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.intent() == intent)
            .map(|m| m.key().to_string())
            .collect()
    }
}

impl SyncQueue for InMemorySyncQueue {
    fn enqueue(&self, message: SyncMessage) -> Result<(), SyncQueueError> {
        let mut messages = self.messages.lock().map_err(|_| SyncQueueError::Poisoned)?;
        messages.push(message);
        Ok(())
    }
}
