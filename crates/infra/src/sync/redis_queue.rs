//! Redis list-backed synchronization queue (optional).
//!
//! Messages are JSON-encoded and appended with `RPUSH`, so a consumer popping
//! from the head sees them in enqueue order.

use redis::Commands;

use shipment_storage_events::{SyncMessage, SyncQueue, SyncQueueError};

#[derive(Debug, Clone)]
pub struct RedisSyncQueue {
    client: redis::Client,
    queue_name: String,
}

impl RedisSyncQueue {
    pub fn new(redis_url: impl AsRef<str>, queue_name: impl Into<String>) -> Result<Self, SyncQueueError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| SyncQueueError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            queue_name: queue_name.into(),
        })
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    fn push(&self, payloads: Vec<String>) -> Result<(), SyncQueueError> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| SyncQueueError::Connection(e.to_string()))?;

        let _: i64 = conn
            .rpush(&self.queue_name, payloads)
            .map_err(|e| SyncQueueError::Command(e.to_string()))?;
        Ok(())
    }
}

fn encode(message: &SyncMessage) -> Result<String, SyncQueueError> {
    serde_json::to_string(message).map_err(|e| SyncQueueError::Serialize(e.to_string()))
}

impl SyncQueue for RedisSyncQueue {
    fn enqueue(&self, message: SyncMessage) -> Result<(), SyncQueueError> {
        self.push(vec![encode(&message)?])
    }

    fn enqueue_all(&self, messages: Vec<SyncMessage>) -> Result<(), SyncQueueError> {
        if messages.is_empty() {
            return Ok(());
        }
        let payloads = messages.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(queue = %self.queue_name, messages = payloads.len(), "enqueueing sync messages");
        self.push(payloads)
    }
}
