//! Bulk export of persisted projections for (re)synchronization.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::instrument;

use shipment_storage_core::{ShipmentTypeId, StorageKeyGenerator, StoreName};
use shipment_storage_kv::{KeyValueStore, StorageError};

/// Offset/limit window. Applied only when both bounds are set.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynchronizationFilter {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl SynchronizationFilter {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset: Some(offset),
            limit: Some(limit),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    fn window(&self) -> Option<(usize, usize)> {
        Some((self.offset?, self.limit?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchronizationEntry {
    pub key: String,
    pub store: StoreName,
    pub shipment_type_id: ShipmentTypeId,
    pub data: JsonValue,
}

#[derive(Debug, Clone)]
pub struct ShipmentTypeStorageExporter<S>
where
    S: KeyValueStore,
{
    storage: S,
    keys: StorageKeyGenerator,
}

impl<S> ShipmentTypeStorageExporter<S>
where
    S: KeyValueStore,
{
    pub fn new(storage: S, keys: StorageKeyGenerator) -> Self {
        Self { storage, keys }
    }

    /// Persisted projections ordered by (id, store).
    ///
    /// A non-empty `ids` restricts the export to those shipment types.
    /// Entries whose payload is missing or malformed are skipped.
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub fn get_synchronization_entries(
        &self,
        filter: &SynchronizationFilter,
        ids: &[ShipmentTypeId],
    ) -> Result<Vec<SynchronizationEntry>, StorageError> {
        let id_filter: BTreeSet<ShipmentTypeId> = ids.iter().copied().collect();

        let mut located: Vec<(ShipmentTypeId, StoreName, String)> = self
            .storage
            .scan_keys(&self.keys.resource_prefix())?
            .into_iter()
            .filter_map(|key| {
                let (store, id) = self.keys.parse_primary_key(&key)?;
                Some((id, store, key))
            })
            .filter(|(id, _, _)| id_filter.is_empty() || id_filter.contains(id))
            .collect();
        located.sort();

        if let Some((offset, limit)) = filter.window() {
            located = located.into_iter().skip(offset).take(limit).collect();
        }
        if located.is_empty() {
            return Ok(vec![]);
        }

        let keys: Vec<String> = located.iter().map(|(_, _, key)| key.clone()).collect();
        let mut stored = self.storage.get_multi(&keys)?;

        Ok(located
            .into_iter()
            .filter_map(|(shipment_type_id, store, key)| {
                let data = stored.remove(&key).flatten()?.decode()?;
                Some(SynchronizationEntry {
                    key,
                    store,
                    shipment_type_id,
                    data,
                })
            })
            .collect())
    }
}
