use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value as JsonValue;

use crate::store::{KeyValueStore, StorageError, StoredValue};

/// In-memory key/value store for tests/dev.
///
/// Counts `get_multi` calls so callers can assert on round trips.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    inner: RwLock<BTreeMap<String, StoredValue>>,
    get_multi_calls: AtomicUsize,
    last_get_multi_keys: RwLock<Vec<String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw JSON text, as a string-oriented backend would hold it.
    pub fn insert_raw(&self, key: impl Into<String>, text: impl Into<String>) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key.into(), StoredValue::Raw(text.into()));
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredValue> {
        self.inner.read().ok()?.get(key).cloned()
    }

    /// Decoded value at `key`, if present and well-formed.
    pub fn get_json(&self, key: &str) -> Option<JsonValue> {
        self.get(key)?.decode()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().map(|m| m.contains_key(key)).unwrap_or(false)
    }

    /// All keys in lexical order.
    pub fn keys(&self) -> Vec<String> {
        match self.inner.read() {
            Ok(m) => m.keys().cloned().collect(),
            Err(_) => vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_multi_calls(&self) -> usize {
        self.get_multi_calls.load(Ordering::SeqCst)
    }

    pub fn last_get_multi_keys(&self) -> Vec<String> {
        self.last_get_multi_keys
            .read()
            .map(|k| k.clone())
            .unwrap_or_default()
    }

    /// Full snapshot, for comparing end states.
    pub fn snapshot(&self) -> BTreeMap<String, StoredValue> {
        self.inner.read().map(|m| m.clone()).unwrap_or_default()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Option<StoredValue>>, StorageError> {
        self.get_multi_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_get_multi_keys.write() {
            *last = keys.to_vec();
        }

        let map = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        Ok(keys
            .iter()
            .map(|k| (k.clone(), map.get(k).cloned()))
            .collect())
    }

    fn set(&self, key: &str, value: JsonValue) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        map.insert(key.to_string(), StoredValue::Decoded(value));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        map.remove(key);
        Ok(())
    }

    fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let map = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        Ok(map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_multi_maps_missing_keys_to_none_in_one_call() {
        let store = InMemoryKeyValueStore::new();
        store.set("a", json!({"x": 1})).unwrap();
        store.insert_raw("b", r#"{"x": 2}"#);

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let got = store.get_multi(&keys).unwrap();

        assert_eq!(store.get_multi_calls(), 1);
        assert_eq!(store.last_get_multi_keys(), keys);
        assert_eq!(got["a"], Some(StoredValue::Decoded(json!({"x": 1}))));
        assert_eq!(got["b"], Some(StoredValue::Raw(r#"{"x": 2}"#.to_string())));
        assert_eq!(got["c"], None);
    }

    #[test]
    fn delete_of_missing_key_is_a_no_op() {
        let store = InMemoryKeyValueStore::new();
        store.delete("missing").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn scan_filters_by_prefix() {
        let store = InMemoryKeyValueStore::new();
        store.set("shipment_type:DE:1", json!({"a": 1})).unwrap();
        store.set("shipment_type:DE:uuid:u1", json!({"id": 1})).unwrap();
        store.set("product:DE:1", json!({"a": 1})).unwrap();

        let mut keys = store.scan_keys("shipment_type:").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["shipment_type:DE:1", "shipment_type:DE:uuid:u1"]);
    }
}
