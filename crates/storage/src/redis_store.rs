//! Redis-backed key/value store (optional).
//!
//! Values are stored as JSON text and handed back as [`StoredValue::Raw`];
//! decoding is left to the reader.

use std::collections::HashMap;

use redis::Commands;
use serde_json::Value as JsonValue;
use tracing::instrument;

use crate::store::{KeyValueStore, StorageError, StoredValue};

#[derive(Debug, Clone)]
pub struct RedisKeyValueStore {
    client: redis::Client,
}

impl RedisKeyValueStore {
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, StorageError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    fn connection(&self) -> Result<redis::Connection, StorageError> {
        self.client
            .get_connection()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn encode(value: &JsonValue) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialize(e.to_string()))
}

impl KeyValueStore for RedisKeyValueStore {
    #[instrument(skip(self, keys), fields(keys = keys.len()))]
    fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Option<StoredValue>>, StorageError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.connection()?;
        // Always MGET, even for one key, so the reply shape is a list.
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query(&mut conn)
            .map_err(|e| StorageError::Command(e.to_string()))?;

        Ok(keys
            .iter()
            .cloned()
            .zip(values.into_iter().map(|v| v.map(StoredValue::Raw)))
            .collect())
    }

    fn set(&self, key: &str, value: JsonValue) -> Result<(), StorageError> {
        let payload = encode(&value)?;
        let mut conn = self.connection()?;
        conn.set::<_, _, ()>(key, payload)
            .map_err(|e| StorageError::Command(e.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.connection()?;
        conn.del::<_, ()>(key)
            .map_err(|e| StorageError::Command(e.to_string()))
    }

    fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut conn = self.connection()?;
        let keys: Vec<String> = conn
            .scan_match::<_, String>(format!("{prefix}*"))
            .map_err(|e| StorageError::Command(e.to_string()))?
            .collect();
        Ok(keys)
    }

    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    fn set_multi(&self, entries: Vec<(String, JsonValue)>) -> Result<(), StorageError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut cmd = redis::cmd("MSET");
        for (key, value) in &entries {
            cmd.arg(key).arg(encode(value)?);
        }

        let mut conn = self.connection()?;
        cmd.query::<()>(&mut conn)
            .map_err(|e| StorageError::Command(e.to_string()))
    }

    fn delete_multi(&self, keys: &[String]) -> Result<(), StorageError> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection()?;
        redis::cmd("DEL")
            .arg(keys)
            .query::<()>(&mut conn)
            .map_err(|e| StorageError::Command(e.to_string()))
    }
}
