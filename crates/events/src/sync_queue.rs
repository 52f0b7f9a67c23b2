//! Synchronization queue abstraction (mechanics only).
//!
//! Every storage mutation made by the projection is followed by a message on
//! the synchronization queue, which feeds downstream search/index pipelines.
//!
//! Delivery is **at-least-once**: consumers must treat messages as "key `k`
//! changed, go look" rather than as deltas. Writes carry the full payload so
//! a consumer can apply them without a storage round trip.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use shipment_storage_core::StoreName;

/// What happened to a key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncIntent {
    Write,
    Delete,
}

/// One synchronization entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMessage {
    message_id: Uuid,
    resource: String,
    store: StoreName,
    key: String,
    intent: SyncIntent,
    /// Full record for writes; `None` for deletes.
    payload: Option<JsonValue>,
    enqueued_at: DateTime<Utc>,
}

impl SyncMessage {
    pub fn write(
        resource: impl Into<String>,
        store: StoreName,
        key: impl Into<String>,
        payload: JsonValue,
    ) -> Self {
        Self::new(resource, store, key, SyncIntent::Write, Some(payload))
    }

    pub fn delete(resource: impl Into<String>, store: StoreName, key: impl Into<String>) -> Self {
        Self::new(resource, store, key, SyncIntent::Delete, None)
    }

    fn new(
        resource: impl Into<String>,
        store: StoreName,
        key: impl Into<String>,
        intent: SyncIntent,
        payload: Option<JsonValue>,
    ) -> Self {
        Self {
            message_id: Uuid::now_v7(),
            resource: resource.into(),
            store,
            key: key.into(),
            intent,
            payload,
            enqueued_at: Utc::now(),
        }
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn store(&self) -> &StoreName {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn intent(&self) -> SyncIntent {
        self.intent
    }

    pub fn payload(&self) -> Option<&JsonValue> {
        self.payload.as_ref()
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }
}

#[derive(Debug, Error)]
pub enum SyncQueueError {
    #[error("sync queue connection error: {0}")]
    Connection(String),

    #[error("sync queue command error: {0}")]
    Command(String),

    #[error("failed to serialize sync message: {0}")]
    Serialize(String),

    /// In-memory queue lock was poisoned.
    #[error("sync queue lock poisoned")]
    Poisoned,
}

/// Outbound queue for synchronization entries.
///
/// `enqueue()` failures are surfaced to the caller; nothing is retried here.
/// Re-delivering the triggering event is the recovery path.
pub trait SyncQueue: Send + Sync {
    fn enqueue(&self, message: SyncMessage) -> Result<(), SyncQueueError>;

    /// Enqueue several messages; stops at the first failure.
    fn enqueue_all(&self, messages: Vec<SyncMessage>) -> Result<(), SyncQueueError> {
        for message in messages {
            self.enqueue(message)?;
        }
        Ok(())
    }
}

impl<Q> SyncQueue for Arc<Q>
where
    Q: SyncQueue + ?Sized,
{
    fn enqueue(&self, message: SyncMessage) -> Result<(), SyncQueueError> {
        (**self).enqueue(message)
    }

    fn enqueue_all(&self, messages: Vec<SyncMessage>) -> Result<(), SyncQueueError> {
        (**self).enqueue_all(messages)
    }
}
