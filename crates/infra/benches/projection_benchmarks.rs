use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use shipment_storage_core::{
    ShipmentCarrier, ShipmentCarrierId, ShipmentMethod, ShipmentMethodId, ShipmentType,
    ShipmentTypeId, StoreName,
};
use shipment_storage_events::{EventEntity, InMemorySyncQueue};
use shipment_storage_infra::{InMemoryEntityReader, ShipmentTypeStorageFacade};
use shipment_storage_kv::InMemoryKeyValueStore;

const STORES: [&str; 3] = ["AT", "DE", "US"];
const METHODS_PER_TYPE: i64 = 4;
const CARRIERS: i64 = 5;

type BenchFacade = ShipmentTypeStorageFacade<
    Arc<InMemoryEntityReader>,
    Arc<InMemoryKeyValueStore>,
    Arc<InMemorySyncQueue>,
>;

fn store(name: &str) -> StoreName {
    StoreName::new(name).unwrap()
}

/// `type_count` active types in every store, each with a few methods spread
/// over the carriers.
fn seeded_reader(type_count: i64) -> Arc<InMemoryEntityReader> {
    let reader = Arc::new(InMemoryEntityReader::new());
    let stores: std::collections::BTreeSet<StoreName> = STORES.iter().map(|s| store(s)).collect();

    for carrier in 1..=CARRIERS {
        reader.upsert_carrier(ShipmentCarrier {
            id: ShipmentCarrierId::new(carrier),
            name: format!("Carrier {carrier}"),
            is_active: true,
        });
    }

    for id in 1..=type_count {
        reader.upsert_shipment_type(ShipmentType {
            id: ShipmentTypeId::new(id),
            key: format!("type-{id}"),
            uuid: format!("uuid-{id}"),
            name: format!("Type {id}"),
            is_active: true,
            store_names: stores.clone(),
        });
        for m in 0..METHODS_PER_TYPE {
            let method_id = id * METHODS_PER_TYPE + m;
            reader.upsert_shipment_method(ShipmentMethod {
                id: ShipmentMethodId::new(method_id),
                carrier_id: ShipmentCarrierId::new(method_id % CARRIERS + 1),
                is_active: true,
                is_carrier_active: true,
                shipment_type_id: Some(ShipmentTypeId::new(id)),
                store_names: stores.clone(),
            });
        }
    }
    reader
}

fn facade(reader: Arc<InMemoryEntityReader>) -> BenchFacade {
    ShipmentTypeStorageFacade::new(
        reader,
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(InMemorySyncQueue::new()),
    )
}

fn bench_full_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_rebuild");

    for type_count in [10_i64, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*type_count as u64 * STORES.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("publish_all", type_count),
            type_count,
            |b, &count| {
                let facade = facade(seeded_reader(count));
                b.iter(|| {
                    black_box(facade.publish_all().unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_carrier_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("carrier_fan_out");

    for type_count in [10_i64, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("one_carrier_event", type_count),
            type_count,
            |b, &count| {
                let facade = facade(seeded_reader(count));
                let events = [EventEntity::new().with_id(1)];
                b.iter(|| {
                    black_box(
                        facade
                            .write_collection_by_shipment_carrier_events(black_box(&events))
                            .unwrap(),
                    );
                });
            },
        );
    }

    group.finish();
}

fn bench_event_batch_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_batch");
    group.sample_size(50);

    let facade = facade(seeded_reader(100));
    // Every type mentioned ten times; the writer sees each id once.
    let events: Vec<EventEntity> = (0..1000).map(|i| EventEntity::new().with_id(i % 100 + 1)).collect();

    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("duplicate_heavy_type_events", |b| {
        b.iter(|| {
            black_box(
                facade
                    .write_collection_by_shipment_type_events(black_box(&events))
                    .unwrap(),
            );
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_full_rebuild,
    bench_carrier_fan_out,
    bench_event_batch_dedup
);
criterion_main!(benches);
