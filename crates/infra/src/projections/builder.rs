//! Pure projection computation: transactional snapshot in, storage plan out.

use std::collections::{BTreeMap, BTreeSet};

use shipment_storage_core::{
    Entity, ShipmentMethod, ShipmentType, ShipmentTypeId, ShipmentTypeStorageProjection,
    ShipmentTypeStorageRecord, StoreName, eligible_shipment_method_ids,
};

use super::expander::{ShipmentTypeStorageExpander, apply_expanders};

/// A (shipment type, store) pair whose record must not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleProjection {
    pub shipment_type_id: ShipmentTypeId,
    pub store: StoreName,
    /// Uuid of the type when it is still known; used to drop the mapping entry.
    pub uuid: Option<String>,
    /// The type still lists this store. Such pairs are deleted and signalled
    /// unconditionally; others only when something is stored under them.
    pub related: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionPlan {
    pub upserts: Vec<ShipmentTypeStorageProjection>,
    pub deletions: Vec<StaleProjection>,
}

impl ProjectionPlan {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }
}

#[derive(Default)]
pub struct ShipmentTypeStorageBuilder {
    expanders: Vec<Box<dyn ShipmentTypeStorageExpander>>,
}

impl core::fmt::Debug for ShipmentTypeStorageBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShipmentTypeStorageBuilder")
            .field("expanders", &self.expanders.len())
            .finish()
    }
}

impl ShipmentTypeStorageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expanders(expanders: Vec<Box<dyn ShipmentTypeStorageExpander>>) -> Self {
        Self { expanders }
    }

    pub fn push_expander(&mut self, expander: Box<dyn ShipmentTypeStorageExpander>) {
        self.expanders.push(expander);
    }

    /// Compute the plan for `requested_ids`.
    ///
    /// Every requested id is either upserted or deleted in every store known
    /// to the platform, so a removed store relation or a vanished type can
    /// never leave a record behind. `methods` may contain methods of other
    /// types; only eligible ones are picked up per pair.
    pub fn build(
        &self,
        requested_ids: &[ShipmentTypeId],
        shipment_types: &[ShipmentType],
        methods: &[ShipmentMethod],
        known_stores: &[StoreName],
    ) -> ProjectionPlan {
        let by_id: BTreeMap<ShipmentTypeId, &ShipmentType> =
            shipment_types.iter().map(|st| (*st.id(), st)).collect();
        let requested: BTreeSet<ShipmentTypeId> = requested_ids.iter().copied().collect();

        let mut plan = ProjectionPlan::default();

        for id in requested {
            let Some(shipment_type) = by_id.get(&id) else {
                plan.deletions.extend(known_stores.iter().map(|store| StaleProjection {
                    shipment_type_id: id,
                    store: store.clone(),
                    uuid: None,
                    related: false,
                }));
                continue;
            };

            let stores: BTreeSet<&StoreName> = known_stores
                .iter()
                .chain(shipment_type.store_names.iter())
                .collect();

            for store in stores {
                if shipment_type.is_published_in(store) {
                    let method_ids = eligible_shipment_method_ids(methods, id, store);
                    plan.upserts.push(ShipmentTypeStorageProjection {
                        store: store.clone(),
                        record: ShipmentTypeStorageRecord::from_shipment_type(shipment_type)
                            .with_shipment_method_ids(method_ids),
                    });
                } else {
                    plan.deletions.push(StaleProjection {
                        shipment_type_id: id,
                        store: store.clone(),
                        uuid: Some(shipment_type.uuid.clone()),
                        related: shipment_type.store_names.contains(store),
                    });
                }
            }
        }

        plan.upserts = apply_expanders(&self.expanders, plan.upserts);
        plan
    }
}
