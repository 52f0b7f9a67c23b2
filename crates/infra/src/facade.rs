//! Entry points of the shipment type storage projection.
//!
//! Event listeners hand their raw batches to one of the
//! `write_collection_by_*_events` methods; bulk tooling uses [`publish_all`]
//! and the synchronization export.
//!
//! [`publish_all`]: ShipmentTypeStorageFacade::publish_all

use std::sync::Arc;

use anyhow::Context;
use tracing::instrument;

use shipment_storage_core::{ShipmentTypeId, StorageKeyGenerator};
use shipment_storage_events::{ChangeEvent, EventEntity, EventTrigger, InMemorySyncQueue, SyncQueue};
use shipment_storage_kv::{InMemoryKeyValueStore, KeyValueStore, StorageError};

use crate::config::ShipmentTypeStorageConfig;
use crate::entity_reader::{EntityReader, InMemoryEntityReader, PostgresEntityReader};
use crate::projections::{
    ShipmentTypeIdResolver, ShipmentTypeStorageBuilder, ShipmentTypeStorageExpander,
    ShipmentTypeStorageExporter, ShipmentTypeStorageWriter, SynchronizationEntry,
    SynchronizationFilter, WriteError, WriteReport,
};

/// Facade over trait objects, as produced by [`bootstrap`].
pub type DynShipmentTypeStorageFacade =
    ShipmentTypeStorageFacade<Arc<dyn EntityReader>, Arc<dyn KeyValueStore>, Arc<dyn SyncQueue>>;

pub struct ShipmentTypeStorageFacade<R, S, Q>
where
    R: EntityReader + Clone,
    S: KeyValueStore + Clone,
    Q: SyncQueue,
{
    resolver: ShipmentTypeIdResolver<R>,
    writer: ShipmentTypeStorageWriter<R, S, Q>,
    exporter: ShipmentTypeStorageExporter<S>,
}

impl<R, S, Q> ShipmentTypeStorageFacade<R, S, Q>
where
    R: EntityReader + Clone,
    S: KeyValueStore + Clone,
    Q: SyncQueue,
{
    pub fn new(reader: R, storage: S, queue: Q) -> Self {
        Self::with_config(
            &ShipmentTypeStorageConfig::default(),
            reader,
            storage,
            queue,
            Vec::new(),
        )
    }

    /// Wire with explicit settings and an ordered list of expanders.
    pub fn with_config(
        config: &ShipmentTypeStorageConfig,
        reader: R,
        storage: S,
        queue: Q,
        expanders: Vec<Box<dyn ShipmentTypeStorageExpander>>,
    ) -> Self {
        let keys = StorageKeyGenerator::new(config.resource_name.clone());
        let writer = ShipmentTypeStorageWriter::new(reader.clone(), storage.clone(), queue)
            .with_key_generator(keys.clone())
            .with_chunk_size(config.write_chunk_size)
            .with_builder(ShipmentTypeStorageBuilder::with_expanders(expanders));

        Self {
            resolver: ShipmentTypeIdResolver::new(reader),
            writer,
            exporter: ShipmentTypeStorageExporter::new(storage, keys),
        }
    }

    pub fn storage(&self) -> &S {
        self.writer.storage()
    }

    pub fn key_generator(&self) -> &StorageKeyGenerator {
        self.writer.key_generator()
    }

    /// `Entity.spy_shipment_type.*` and `ShipmentType.shipment_type.publish`.
    pub fn write_collection_by_shipment_type_events(
        &self,
        events: &[EventEntity],
    ) -> Result<WriteReport, WriteError> {
        self.write_collection(&ChangeEvent::ingest_batch(EventTrigger::ShipmentType, events))
    }

    /// `Entity.spy_shipment_type_store.*`.
    pub fn write_collection_by_shipment_type_store_events(
        &self,
        events: &[EventEntity],
    ) -> Result<WriteReport, WriteError> {
        self.write_collection(&ChangeEvent::ingest_batch(
            EventTrigger::ShipmentTypeStoreRelation,
            events,
        ))
    }

    /// `Entity.spy_shipment_method.*`.
    pub fn write_collection_by_shipment_method_events(
        &self,
        events: &[EventEntity],
    ) -> Result<WriteReport, WriteError> {
        self.write_collection(&ChangeEvent::ingest_batch(EventTrigger::ShipmentMethod, events))
    }

    /// `Entity.spy_shipment_carrier.*`.
    pub fn write_collection_by_shipment_carrier_events(
        &self,
        events: &[EventEntity],
    ) -> Result<WriteReport, WriteError> {
        self.write_collection(&ChangeEvent::ingest_batch(EventTrigger::ShipmentCarrier, events))
    }

    /// Mixed batch; each event is classified by its own name.
    pub fn write_collection_by_named_events(
        &self,
        events: &[EventEntity],
    ) -> Result<WriteReport, WriteError> {
        self.write_collection(&ChangeEvent::ingest_named(events))
    }

    #[instrument(skip(self, events), fields(events = events.len()))]
    pub fn write_collection(&self, events: &[ChangeEvent]) -> Result<WriteReport, WriteError> {
        if events.is_empty() {
            return Ok(WriteReport::default());
        }

        let resolution = self.resolver.resolve(events);
        let mut report = if resolution.shipment_type_ids.is_empty() {
            tracing::debug!("events resolved to no shipment types");
            WriteReport::default()
        } else {
            self.writer.write_shipment_type_ids(&resolution.shipment_type_ids)?
        };

        report.failed_carriers = resolution.failed_carriers;
        Ok(report)
    }

    /// Recompute the given shipment types regardless of any event.
    pub fn publish(&self, ids: &[ShipmentTypeId]) -> Result<WriteReport, WriteError> {
        self.writer.write_shipment_type_ids(ids)
    }

    /// Full rebuild over every shipment type on the read side.
    #[instrument(skip(self))]
    pub fn publish_all(&self) -> Result<WriteReport, WriteError> {
        let ids = self.writer.reader().find_all_shipment_type_ids()?;
        tracing::info!(ids = ids.len(), "rebuilding shipment type storage");
        self.writer.write_shipment_type_ids(&ids)
    }

    pub fn get_synchronization_entries(
        &self,
        filter: &SynchronizationFilter,
        ids: &[ShipmentTypeId],
    ) -> Result<Vec<SynchronizationEntry>, StorageError> {
        self.exporter.get_synchronization_entries(filter, ids)
    }
}

/// Build a facade on the adapters selected by `config`.
///
/// `DATABASE_URL` selects the Postgres entity reader, `REDIS_URL` the Redis
/// store and queue (with the `redis` feature). Anything unset falls back to
/// the in-memory adapter.
pub fn bootstrap(
    config: &ShipmentTypeStorageConfig,
    expanders: Vec<Box<dyn ShipmentTypeStorageExpander>>,
) -> anyhow::Result<DynShipmentTypeStorageFacade> {
    config.validate().context("invalid shipment type storage configuration")?;

    let reader: Arc<dyn EntityReader> = match &config.database_url {
        Some(url) => Arc::new(
            PostgresEntityReader::connect(url).context("failed to connect the entity reader")?,
        ),
        None => {
            tracing::warn!("DATABASE_URL not set, using an empty in-memory entity reader");
            Arc::new(InMemoryEntityReader::new())
        }
    };

    let (storage, queue) = storage_and_queue(config)?;

    Ok(ShipmentTypeStorageFacade::with_config(
        config, reader, storage, queue, expanders,
    ))
}

#[cfg(feature = "redis")]
fn storage_and_queue(
    config: &ShipmentTypeStorageConfig,
) -> anyhow::Result<(Arc<dyn KeyValueStore>, Arc<dyn SyncQueue>)> {
    let Some(url) = &config.redis_url else {
        return Ok(in_memory_storage_and_queue());
    };

    let storage = shipment_storage_kv::RedisKeyValueStore::new(url)
        .context("failed to open the redis key/value store")?;
    let queue = crate::sync::RedisSyncQueue::new(url, config.sync_queue_name.clone())
        .context("failed to open the redis sync queue")?;
    Ok((Arc::new(storage), Arc::new(queue)))
}

#[cfg(not(feature = "redis"))]
fn storage_and_queue(
    config: &ShipmentTypeStorageConfig,
) -> anyhow::Result<(Arc<dyn KeyValueStore>, Arc<dyn SyncQueue>)> {
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL is set but the redis feature is not enabled, falling back to in-memory");
    }
    Ok(in_memory_storage_and_queue())
}

fn in_memory_storage_and_queue() -> (Arc<dyn KeyValueStore>, Arc<dyn SyncQueue>) {
    (
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(InMemorySyncQueue::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_without_urls_uses_in_memory_adapters() {
        let facade = bootstrap(&ShipmentTypeStorageConfig::default(), Vec::new()).unwrap();

        assert_eq!(facade.key_generator().resource(), "shipment_type");
        let report = facade.publish_all().unwrap();
        assert_eq!(report, WriteReport::default());
    }

    #[test]
    fn bootstrap_rejects_invalid_config() {
        let config = ShipmentTypeStorageConfig {
            write_chunk_size: 0,
            ..ShipmentTypeStorageConfig::default()
        };
        assert!(bootstrap(&config, Vec::new()).is_err());
    }
}
