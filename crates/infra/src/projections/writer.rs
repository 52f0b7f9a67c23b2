//! Applies projection plans to the key/value store and signals the sync queue.
//!
//! Every write is a full overwrite of the freshly computed record, so running
//! the same batch twice (or two overlapping batches concurrently) converges
//! to the same storage state.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tracing::instrument;

use shipment_storage_core::{
    ShipmentCarrierId, ShipmentTypeId, ShipmentTypeStorageRecord, StorageKeyGenerator, StoreName,
    UuidMapping,
};
use shipment_storage_events::{SyncMessage, SyncQueue, SyncQueueError};
use shipment_storage_kv::{KeyValueStore, StorageError, StoredValue};

use super::builder::{ProjectionPlan, ShipmentTypeStorageBuilder, StaleProjection};
use super::expander::ShipmentTypeStorageExpander;
use crate::entity_reader::{EntityReadError, EntityReader};

pub const DEFAULT_WRITE_CHUNK_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum WriteError {
    /// A lookup the whole batch depends on (e.g. the store list) failed.
    #[error("entity read failed: {0}")]
    EntityRead(#[from] EntityReadError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Queue(#[from] SyncQueueError),

    #[error("failed to serialize storage payload: {0}")]
    Serialize(String),

    #[error(
        "{} shipment type ids and {} carrier ids could not be projected",
        .failed_ids.len(),
        .failed_carrier_ids.len()
    )]
    PartialFailure {
        failed_ids: Vec<ShipmentTypeId>,
        failed_carrier_ids: Vec<ShipmentCarrierId>,
    },
}

/// A shipment type whose transactional data could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedShipmentType {
    pub shipment_type_id: ShipmentTypeId,
    pub error: EntityReadError,
}

/// A carrier whose shipment types could not be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCarrier {
    pub shipment_carrier_id: ShipmentCarrierId,
    pub error: EntityReadError,
}

/// Outcome of one writer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Records written (one per type and store).
    pub upserted: usize,
    /// Records deleted and signalled downstream.
    pub deleted: usize,
    pub failed: Vec<FailedShipmentType>,
    pub failed_carriers: Vec<FailedCarrier>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.failed_carriers.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<ShipmentTypeId> {
        self.failed.iter().map(|f| f.shipment_type_id).collect()
    }

    pub fn failed_carrier_ids(&self) -> Vec<ShipmentCarrierId> {
        self.failed_carriers.iter().map(|f| f.shipment_carrier_id).collect()
    }

    /// Turn a report with failures into [`WriteError::PartialFailure`].
    pub fn into_result(self) -> Result<Self, WriteError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(WriteError::PartialFailure {
                failed_ids: self.failed_ids(),
                failed_carrier_ids: self.failed_carrier_ids(),
            })
        }
    }

    fn merge(&mut self, other: WriteReport) {
        self.upserted += other.upserted;
        self.deleted += other.deleted;
        self.failed.extend(other.failed);
        self.failed_carriers.extend(other.failed_carriers);
    }
}

pub struct ShipmentTypeStorageWriter<R, S, Q>
where
    R: EntityReader,
    S: KeyValueStore,
    Q: SyncQueue,
{
    reader: R,
    storage: S,
    queue: Q,
    keys: StorageKeyGenerator,
    builder: ShipmentTypeStorageBuilder,
    chunk_size: usize,
}

impl<R, S, Q> core::fmt::Debug for ShipmentTypeStorageWriter<R, S, Q>
where
    R: EntityReader,
    S: KeyValueStore,
    Q: SyncQueue,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShipmentTypeStorageWriter")
            .field("keys", &self.keys)
            .field("builder", &self.builder)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl<R, S, Q> ShipmentTypeStorageWriter<R, S, Q>
where
    R: EntityReader,
    S: KeyValueStore,
    Q: SyncQueue,
{
    pub fn new(reader: R, storage: S, queue: Q) -> Self {
        Self {
            reader,
            storage,
            queue,
            keys: StorageKeyGenerator::default(),
            builder: ShipmentTypeStorageBuilder::new(),
            chunk_size: DEFAULT_WRITE_CHUNK_SIZE,
        }
    }

    pub fn with_key_generator(mut self, keys: StorageKeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    /// Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_expander(mut self, expander: impl ShipmentTypeStorageExpander + 'static) -> Self {
        self.builder.push_expander(Box::new(expander));
        self
    }

    pub fn with_builder(mut self, builder: ShipmentTypeStorageBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key_generator(&self) -> &StorageKeyGenerator {
        &self.keys
    }

    /// Recompute and persist the projections of `ids` in every known store.
    ///
    /// A chunk whose read fails is split until the failing ids are isolated;
    /// only those are reported. Storage and queue failures abort the run.
    #[instrument(skip(self, ids), fields(ids = ids.len(), resource = %self.keys.resource()))]
    pub fn write_shipment_type_ids(&self, ids: &[ShipmentTypeId]) -> Result<WriteReport, WriteError> {
        let ids: Vec<ShipmentTypeId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if ids.is_empty() {
            return Ok(WriteReport::default());
        }

        let known_stores = self.reader.find_store_names()?;
        let mut report = WriteReport::default();

        for chunk in ids.chunks(self.chunk_size) {
            self.write_chunk(chunk, &known_stores, &mut report)?;
        }

        tracing::info!(
            upserted = report.upserted,
            deleted = report.deleted,
            failed = report.failed.len(),
            "shipment type storage written"
        );
        Ok(report)
    }

    fn write_chunk(
        &self,
        chunk: &[ShipmentTypeId],
        known_stores: &[StoreName],
        report: &mut WriteReport,
    ) -> Result<(), WriteError> {
        match self.plan_chunk(chunk, known_stores) {
            Ok(plan) => report.merge(self.apply(plan)?),
            Err(error) if chunk.len() > 1 => {
                tracing::debug!(ids = chunk.len(), error = %error, "chunk read failed; splitting");
                let (left, right) = chunk.split_at(chunk.len() / 2);
                self.write_chunk(left, known_stores, report)?;
                self.write_chunk(right, known_stores, report)?;
            }
            Err(error) => {
                tracing::warn!(
                    shipment_type_id = %chunk[0],
                    error = %error,
                    "failed to read shipment type; skipping"
                );
                report.failed.push(FailedShipmentType {
                    shipment_type_id: chunk[0],
                    error,
                });
            }
        }
        Ok(())
    }

    fn plan_chunk(
        &self,
        chunk: &[ShipmentTypeId],
        known_stores: &[StoreName],
    ) -> Result<ProjectionPlan, EntityReadError> {
        let shipment_types = self.reader.fetch_shipment_types_by_ids(chunk)?;
        let found: Vec<ShipmentTypeId> = shipment_types.iter().map(|st| st.id).collect();
        let methods = if found.is_empty() {
            vec![]
        } else {
            self.reader.find_shipment_methods_by_shipment_type_ids(&found)?
        };

        Ok(self.builder.build(chunk, &shipment_types, &methods, known_stores))
    }

    fn apply(&self, plan: ProjectionPlan) -> Result<WriteReport, WriteError> {
        let mut report = WriteReport::default();
        if plan.is_empty() {
            return Ok(report);
        }

        report.upserted = self.apply_upserts(&plan)?;
        report.deleted = self.apply_deletions(&plan.deletions)?;
        Ok(report)
    }

    fn apply_upserts(&self, plan: &ProjectionPlan) -> Result<usize, WriteError> {
        if plan.upserts.is_empty() {
            return Ok(0);
        }

        let resource = self.keys.resource();
        let mut entries = Vec::with_capacity(plan.upserts.len() * 2);
        let mut messages = Vec::with_capacity(plan.upserts.len());

        for projection in &plan.upserts {
            let record = &projection.record;
            let payload = record
                .to_payload()
                .map_err(|e| WriteError::Serialize(e.to_string()))?;
            let key = self.keys.primary_key(&projection.store, record.id_shipment_type);

            if !record.uuid.is_empty() {
                let mapping = serde_json::to_value(UuidMapping {
                    id: record.id_shipment_type,
                })
                .map_err(|e| WriteError::Serialize(e.to_string()))?;
                entries.push((self.keys.uuid_mapping_key(&projection.store, &record.uuid), mapping));
            }

            messages.push(SyncMessage::write(
                resource,
                projection.store.clone(),
                key.clone(),
                payload.clone(),
            ));
            entries.push((key, payload));
        }

        self.storage.set_multi(entries).inspect_err(|e| {
            tracing::error!(error = %e, "failed to write shipment type storage records");
        })?;
        self.queue.enqueue_all(messages)?;

        Ok(plan.upserts.len())
    }

    /// Delete stale records with their mapping entries and signal each one.
    ///
    /// Pairs in a store the type is related to are always signalled. Pairs
    /// outside the type's relations are only touched when the record or its
    /// mapping entry is actually stored.
    fn apply_deletions(&self, deletions: &[StaleProjection]) -> Result<usize, WriteError> {
        if deletions.is_empty() {
            return Ok(0);
        }

        let resource = self.keys.resource();
        let mut stored = self.lookup_unrelated(deletions)?;
        let mut keys = Vec::new();
        let mut messages = Vec::new();

        for deletion in deletions {
            let primary_key = self.keys.primary_key(&deletion.store, deletion.shipment_type_id);
            let known_mapping_key = deletion
                .uuid
                .as_deref()
                .filter(|uuid| !uuid.is_empty())
                .map(|uuid| self.keys.uuid_mapping_key(&deletion.store, uuid));

            let stored_record = stored.remove(&primary_key).flatten();
            let mapping_stored = known_mapping_key
                .as_ref()
                .is_some_and(|key| stored.remove(key).flatten().is_some());
            if !deletion.related && stored_record.is_none() && !mapping_stored {
                continue;
            }

            let stored_uuid = stored_record
                .and_then(|value| value.decode())
                .and_then(|payload| ShipmentTypeStorageRecord::from_payload(payload).ok())
                .map(|record| record.uuid)
                .filter(|uuid| !uuid.is_empty());
            let mapping_keys: BTreeSet<String> = known_mapping_key
                .into_iter()
                .chain(stored_uuid.map(|uuid| self.keys.uuid_mapping_key(&deletion.store, &uuid)))
                .collect();

            keys.push(primary_key.clone());
            keys.extend(mapping_keys);
            messages.push(SyncMessage::delete(resource, deletion.store.clone(), primary_key));
        }

        if messages.is_empty() {
            return Ok(0);
        }

        self.storage.delete_multi(&keys).inspect_err(|e| {
            tracing::error!(error = %e, "failed to delete shipment type storage records");
        })?;

        let deleted = messages.len();
        self.queue.enqueue_all(messages)?;
        Ok(deleted)
    }

    /// Stored values of the records and mapping entries of deletions outside
    /// the type's store relations, in one round trip.
    fn lookup_unrelated(
        &self,
        deletions: &[StaleProjection],
    ) -> Result<HashMap<String, Option<StoredValue>>, WriteError> {
        let lookup: Vec<String> = deletions
            .iter()
            .filter(|d| !d.related)
            .flat_map(|d| {
                let mapping = d
                    .uuid
                    .as_deref()
                    .filter(|uuid| !uuid.is_empty())
                    .map(|uuid| self.keys.uuid_mapping_key(&d.store, uuid));
                std::iter::once(self.keys.primary_key(&d.store, d.shipment_type_id)).chain(mapping)
            })
            .collect();
        if lookup.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self.storage.get_multi(&lookup)?)
    }
}
