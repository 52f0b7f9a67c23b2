//! Maps change events onto the shipment type ids whose projections are stale.

use std::collections::BTreeSet;

use tracing::instrument;

use shipment_storage_core::{ShipmentCarrierId, ShipmentTypeId};
use shipment_storage_events::ChangeEvent;

use super::writer::FailedCarrier;
use crate::entity_reader::{EntityReadError, EntityReader};

/// Shipment type ids affected by a batch, plus carriers that could not be
/// looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentTypeResolution {
    /// Deduplicated, ascending.
    pub shipment_type_ids: Vec<ShipmentTypeId>,
    pub failed_carriers: Vec<FailedCarrier>,
}

#[derive(Debug, Clone)]
pub struct ShipmentTypeIdResolver<R>
where
    R: EntityReader,
{
    reader: R,
}

impl<R> ShipmentTypeIdResolver<R>
where
    R: EntityReader,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Shipment type ids affected by `events`.
    ///
    /// Direct, store relation and method events carry the id themselves.
    /// Carrier events are resolved through the methods the carrier owns; a
    /// failed lookup is retried per carrier and only the carriers that still
    /// fail are reported.
    #[instrument(skip(self, events), fields(events = events.len()))]
    pub fn resolve(&self, events: &[ChangeEvent]) -> ShipmentTypeResolution {
        let mut ids = BTreeSet::new();
        let mut carrier_ids = BTreeSet::new();

        for event in events {
            match event {
                ChangeEvent::ShipmentType { shipment_type_id }
                | ChangeEvent::ShipmentTypeStoreRelation { shipment_type_id }
                | ChangeEvent::ShipmentMethod { shipment_type_id } => {
                    ids.insert(*shipment_type_id);
                }
                ChangeEvent::ShipmentCarrier { shipment_carrier_id } => {
                    carrier_ids.insert(*shipment_carrier_id);
                }
            }
        }

        let mut failed_carriers = Vec::new();
        if !carrier_ids.is_empty() {
            let carrier_ids: Vec<ShipmentCarrierId> = carrier_ids.into_iter().collect();
            self.resolve_carriers(&carrier_ids, &mut ids, &mut failed_carriers);
        }

        ShipmentTypeResolution {
            shipment_type_ids: ids.into_iter().collect(),
            failed_carriers,
        }
    }

    fn resolve_carriers(
        &self,
        carrier_ids: &[ShipmentCarrierId],
        ids: &mut BTreeSet<ShipmentTypeId>,
        failed: &mut Vec<FailedCarrier>,
    ) {
        match self.resolve_by_carrier_ids(carrier_ids) {
            Ok(resolved) => ids.extend(resolved),
            Err(error) if carrier_ids.len() > 1 => {
                tracing::debug!(
                    carriers = carrier_ids.len(),
                    error = %error,
                    "carrier lookup failed; retrying per carrier"
                );
                for carrier_id in carrier_ids {
                    self.resolve_carriers(core::slice::from_ref(carrier_id), ids, failed);
                }
            }
            Err(error) => {
                tracing::warn!(
                    shipment_carrier_id = %carrier_ids[0],
                    error = %error,
                    "failed to resolve shipment types of carrier; skipping"
                );
                failed.push(FailedCarrier {
                    shipment_carrier_id: carrier_ids[0],
                    error,
                });
            }
        }
    }

    fn resolve_by_carrier_ids(
        &self,
        carrier_ids: &[ShipmentCarrierId],
    ) -> Result<Vec<ShipmentTypeId>, EntityReadError> {
        let method_ids = self.reader.find_shipment_method_ids_by_carrier_ids(carrier_ids)?;
        if method_ids.is_empty() {
            tracing::debug!(carriers = carrier_ids.len(), "carriers own no shipment methods");
            return Ok(vec![]);
        }

        self.reader.find_shipment_type_ids_by_shipment_method_ids(&method_ids)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shipment_storage_core::{ShipmentCarrier, ShipmentMethod, ShipmentMethodId, StoreName};

    use super::*;
    use crate::entity_reader::InMemoryEntityReader;

    fn method(id: i64, carrier: i64, shipment_type: Option<i64>) -> ShipmentMethod {
        ShipmentMethod {
            id: ShipmentMethodId::new(id),
            carrier_id: ShipmentCarrierId::new(carrier),
            is_active: true,
            is_carrier_active: true,
            shipment_type_id: shipment_type.map(ShipmentTypeId::new),
            store_names: [StoreName::new("DE").unwrap()].into_iter().collect(),
        }
    }

    fn ids(raw: &[i64]) -> Vec<ShipmentTypeId> {
        raw.iter().copied().map(ShipmentTypeId::new).collect()
    }

    #[test]
    fn direct_events_are_deduplicated() {
        let resolver = ShipmentTypeIdResolver::new(InMemoryEntityReader::new());
        let events = vec![
            ChangeEvent::ShipmentType { shipment_type_id: ShipmentTypeId::new(3) },
            ChangeEvent::ShipmentTypeStoreRelation { shipment_type_id: ShipmentTypeId::new(1) },
            ChangeEvent::ShipmentMethod { shipment_type_id: ShipmentTypeId::new(3) },
        ];

        assert_eq!(resolver.resolve(&events).shipment_type_ids, ids(&[1, 3]));
    }

    #[test]
    fn empty_batch_resolves_to_nothing() {
        let resolver = ShipmentTypeIdResolver::new(InMemoryEntityReader::new());
        assert_eq!(resolver.resolve(&[]), ShipmentTypeResolution::default());
    }

    #[test]
    fn carrier_events_resolve_transitively() {
        let reader = Arc::new(InMemoryEntityReader::new());
        reader.upsert_carrier(ShipmentCarrier {
            id: ShipmentCarrierId::new(1),
            name: "DHL".into(),
            is_active: true,
        });
        reader.upsert_shipment_method(method(10, 1, Some(5)));
        reader.upsert_shipment_method(method(11, 1, Some(6)));
        reader.upsert_shipment_method(method(12, 1, None));
        reader.upsert_shipment_method(method(20, 2, Some(7)));

        let resolver = ShipmentTypeIdResolver::new(reader.clone());
        let events = vec![
            ChangeEvent::ShipmentCarrier { shipment_carrier_id: ShipmentCarrierId::new(1) },
            ChangeEvent::ShipmentCarrier { shipment_carrier_id: ShipmentCarrierId::new(1) },
        ];

        assert_eq!(resolver.resolve(&events).shipment_type_ids, ids(&[5, 6]));
    }

    #[test]
    fn carrier_without_methods_resolves_to_nothing() {
        let resolver = ShipmentTypeIdResolver::new(InMemoryEntityReader::new());
        let events = vec![ChangeEvent::ShipmentCarrier {
            shipment_carrier_id: ShipmentCarrierId::new(9),
        }];
        assert!(resolver.resolve(&events).shipment_type_ids.is_empty());
    }

    #[test]
    fn failed_carrier_lookup_keeps_direct_ids_and_other_carriers() {
        let reader = Arc::new(InMemoryEntityReader::new());
        reader.upsert_shipment_method(method(10, 1, Some(5)));
        reader.upsert_shipment_method(method(20, 2, Some(6)));
        reader.fail_carrier_lookup_for(ShipmentCarrierId::new(2));

        let resolver = ShipmentTypeIdResolver::new(reader.clone());
        let events = vec![
            ChangeEvent::ShipmentType { shipment_type_id: ShipmentTypeId::new(1) },
            ChangeEvent::ShipmentCarrier { shipment_carrier_id: ShipmentCarrierId::new(1) },
            ChangeEvent::ShipmentCarrier { shipment_carrier_id: ShipmentCarrierId::new(2) },
        ];

        let resolution = resolver.resolve(&events);

        assert_eq!(resolution.shipment_type_ids, ids(&[1, 5]));
        assert_eq!(resolution.failed_carriers.len(), 1);
        assert_eq!(resolution.failed_carriers[0].shipment_carrier_id, ShipmentCarrierId::new(2));
    }
}
