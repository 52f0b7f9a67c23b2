use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

/// A value as returned by a storage backend.
///
/// Some backends hand back already-decoded structures, others raw JSON text.
/// Readers must accept both.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Decoded(JsonValue),
    Raw(String),
}

impl StoredValue {
    /// Decode into JSON, treating malformed text and empty values as absent.
    ///
    /// `null`, `""`, `{}` and `[]` all count as empty.
    pub fn decode(self) -> Option<JsonValue> {
        let value = match self {
            Self::Decoded(v) => v,
            Self::Raw(text) => match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping malformed storage payload");
                    return None;
                }
            },
        };

        let is_empty = match &value {
            JsonValue::Null => true,
            JsonValue::String(s) => s.is_empty(),
            JsonValue::Object(m) => m.is_empty(),
            JsonValue::Array(a) => a.is_empty(),
            _ => false,
        };
        if is_empty { None } else { Some(value) }
    }
}

impl From<JsonValue> for StoredValue {
    fn from(value: JsonValue) -> Self {
        Self::Decoded(value)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage connection error: {0}")]
    Connection(String),

    #[error("storage command error: {0}")]
    Command(String),

    #[error("failed to serialize storage payload: {0}")]
    Serialize(String),

    /// In-memory store lock was poisoned.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Key/value storage the projection is written to and read from.
///
/// `get_multi` must be answered with a single backend round trip regardless
/// of how many keys are requested. Keys missing from the backend map to
/// `None`. Deleting a missing key is a no-op.
pub trait KeyValueStore: Send + Sync {
    fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Option<StoredValue>>, StorageError>;

    fn set(&self, key: &str, value: JsonValue) -> Result<(), StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// All keys starting with `prefix`, in no particular order.
    fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    fn set_multi(&self, entries: Vec<(String, JsonValue)>) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(&key, value)?;
        }
        Ok(())
    }

    fn delete_multi(&self, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Option<StoredValue>>, StorageError> {
        (**self).get_multi(keys)
    }

    fn set(&self, key: &str, value: JsonValue) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }

    fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        (**self).scan_keys(prefix)
    }

    fn set_multi(&self, entries: Vec<(String, JsonValue)>) -> Result<(), StorageError> {
        (**self).set_multi(entries)
    }

    fn delete_multi(&self, keys: &[String]) -> Result<(), StorageError> {
        (**self).delete_multi(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_accepts_both_payload_forms() {
        assert_eq!(
            StoredValue::Raw(r#"{"id": 1}"#.to_string()).decode(),
            Some(json!({"id": 1}))
        );
        assert_eq!(StoredValue::Decoded(json!({"id": 1})).decode(), Some(json!({"id": 1})));
    }

    #[test]
    fn decode_treats_malformed_and_empty_as_absent() {
        assert_eq!(StoredValue::Raw("{not json".to_string()).decode(), None);
        assert_eq!(StoredValue::Raw(String::new()).decode(), None);
        assert_eq!(StoredValue::Raw("null".to_string()).decode(), None);
        assert_eq!(StoredValue::Decoded(json!({})).decode(), None);
        assert_eq!(StoredValue::Decoded(json!([])).decode(), None);
    }
}
