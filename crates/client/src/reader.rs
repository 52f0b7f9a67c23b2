//! Consumer-side reader over the shipment type storage keyspace.
//!
//! Every lookup is answered with at most one batched `get_multi` per key kind:
//! one for uuid mapping entries (uuid lookups only) and one for records.
//! "Not found" is an empty collection, never an error.

use std::collections::HashSet;

use thiserror::Error;
use tracing::instrument;

use shipment_storage_core::{
    DomainError, ShipmentTypeId, ShipmentTypeStorageRecord, StorageKeyGenerator, StoreName,
    UuidMapping,
};
use shipment_storage_kv::{KeyValueStore, StorageError};

use crate::criteria::{Lookup, ShipmentTypeStorageCriteria};

#[derive(Debug, Error)]
pub enum ReadError {
    /// The criteria were incomplete; raised before any storage access.
    #[error(transparent)]
    Precondition(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Records found by a lookup, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentTypeStorageCollection {
    shipment_type_storages: Vec<ShipmentTypeStorageRecord>,
}

impl ShipmentTypeStorageCollection {
    pub fn shipment_type_storages(&self) -> &[ShipmentTypeStorageRecord] {
        &self.shipment_type_storages
    }

    pub fn len(&self) -> usize {
        self.shipment_type_storages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipment_type_storages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShipmentTypeStorageRecord> {
        self.shipment_type_storages.iter()
    }
}

impl IntoIterator for ShipmentTypeStorageCollection {
    type Item = ShipmentTypeStorageRecord;
    type IntoIter = std::vec::IntoIter<ShipmentTypeStorageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.shipment_type_storages.into_iter()
    }
}

/// Reads shipment type projections for one store.
#[derive(Debug, Clone)]
pub struct ShipmentTypeStorageReader<S>
where
    S: KeyValueStore,
{
    keys: StorageKeyGenerator,
    storage: S,
}

impl<S> ShipmentTypeStorageReader<S>
where
    S: KeyValueStore,
{
    pub fn new(storage: S) -> Self {
        Self::with_key_generator(storage, StorageKeyGenerator::default())
    }

    pub fn with_key_generator(storage: S, keys: StorageKeyGenerator) -> Self {
        Self { keys, storage }
    }

    /// Look up projections by uuids or by shipment type ids.
    ///
    /// Fails only when the criteria are incomplete (no conditions, or a
    /// non-empty lookup without store name) or the backend itself fails.
    #[instrument(skip(self, criteria))]
    pub fn get_shipment_type_storage_collection(
        &self,
        criteria: &ShipmentTypeStorageCriteria,
    ) -> Result<ShipmentTypeStorageCollection, ReadError> {
        match criteria.to_lookup()? {
            Lookup::Empty => Ok(ShipmentTypeStorageCollection::default()),
            Lookup::ByUuids { uuids, store } => self.get_by_uuids(&uuids, &store),
            Lookup::ByIds { ids, store } => self.get_by_shipment_type_ids(&ids, &store),
        }
    }

    fn get_by_uuids(
        &self,
        uuids: &[String],
        store: &StoreName,
    ) -> Result<ShipmentTypeStorageCollection, ReadError> {
        let mapping_keys = self.keys.uuid_mapping_keys(uuids, store);
        if mapping_keys.is_empty() {
            return Ok(ShipmentTypeStorageCollection::default());
        }

        let mut mapping_data = self.storage.get_multi(&mapping_keys)?;
        let ids: Vec<ShipmentTypeId> = mapping_keys
            .iter()
            .filter_map(|key| mapping_data.remove(key).flatten())
            .filter_map(|value| value.decode())
            .filter_map(|payload| UuidMapping::extract_id(&payload))
            .collect();

        if ids.is_empty() {
            tracing::debug!(store = %store, uuids = uuids.len(), "no uuid mappings found");
            return Ok(ShipmentTypeStorageCollection::default());
        }

        self.get_by_shipment_type_ids(&ids, store)
    }

    fn get_by_shipment_type_ids(
        &self,
        ids: &[ShipmentTypeId],
        store: &StoreName,
    ) -> Result<ShipmentTypeStorageCollection, ReadError> {
        let storage_keys = self.keys.primary_keys(ids, store);
        if storage_keys.is_empty() {
            return Ok(ShipmentTypeStorageCollection::default());
        }

        let mut storage_data = self.storage.get_multi(&storage_keys)?;
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(storage_keys.len());

        for key in &storage_keys {
            if !seen.insert(key.as_str()) {
                continue;
            }
            let Some(payload) = storage_data.remove(key).flatten().and_then(|v| v.decode()) else {
                continue;
            };

            match ShipmentTypeStorageRecord::from_payload(payload) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(%key, error = %e, "skipping malformed shipment type storage record"),
            }
        }

        Ok(ShipmentTypeStorageCollection {
            shipment_type_storages: records,
        })
    }
}
