use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use shipment_storage_core::{
    ShipmentCarrier, ShipmentCarrierId, ShipmentMethod, ShipmentMethodId, ShipmentType,
    ShipmentTypeId, StoreName,
};

use super::{EntityReadError, EntityReader};

#[derive(Debug, Default)]
struct Tables {
    stores: BTreeSet<StoreName>,
    shipment_types: BTreeMap<ShipmentTypeId, ShipmentType>,
    carriers: BTreeMap<ShipmentCarrierId, ShipmentCarrier>,
    methods: BTreeMap<ShipmentMethodId, ShipmentMethod>,
    /// Shipment type ids whose fetch fails (fault injection for tests).
    failing_shipment_type_ids: BTreeSet<ShipmentTypeId>,
    failing_carrier_ids: BTreeSet<ShipmentCarrierId>,
}

/// In-memory transactional data for tests/dev.
///
/// Carrier activity is joined at read time, so toggling a carrier is
/// immediately visible through every method it owns.
#[derive(Debug, Default)]
pub struct InMemoryEntityReader {
    tables: RwLock<Tables>,
}

impl InMemoryEntityReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn write<F: FnOnce(&mut Tables)>(&self, f: F) {
        if let Ok(mut tables) = self.tables.write() {
            f(&mut tables);
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, EntityReadError> {
        self.tables
            .read()
            .map_err(|_| EntityReadError::Connection("in-memory tables poisoned".to_string()))
    }

    pub fn add_store(&self, store: StoreName) {
        self.write(|t| {
            t.stores.insert(store);
        });
    }

    /// Insert or replace a shipment type; its stores are registered too.
    pub fn upsert_shipment_type(&self, shipment_type: ShipmentType) {
        self.write(|t| {
            t.stores.extend(shipment_type.store_names.iter().cloned());
            t.shipment_types.insert(shipment_type.id, shipment_type);
        });
    }

    pub fn remove_shipment_type(&self, id: ShipmentTypeId) {
        self.write(|t| {
            t.shipment_types.remove(&id);
        });
    }

    pub fn set_shipment_type_active(&self, id: ShipmentTypeId, is_active: bool) {
        self.write(|t| {
            if let Some(st) = t.shipment_types.get_mut(&id) {
                st.is_active = is_active;
            }
        });
    }

    pub fn remove_store_relation(&self, id: ShipmentTypeId, store: &StoreName) {
        self.write(|t| {
            if let Some(st) = t.shipment_types.get_mut(&id) {
                st.store_names.remove(store);
            }
        });
    }

    pub fn upsert_carrier(&self, carrier: ShipmentCarrier) {
        self.write(|t| {
            t.carriers.insert(carrier.id, carrier);
        });
    }

    pub fn set_carrier_active(&self, id: ShipmentCarrierId, is_active: bool) {
        self.write(|t| {
            if let Some(c) = t.carriers.get_mut(&id) {
                c.is_active = is_active;
            }
        });
    }

    /// Insert or replace a method. `is_carrier_active` is ignored; it is
    /// derived from the carrier table on read.
    pub fn upsert_shipment_method(&self, method: ShipmentMethod) {
        self.write(|t| {
            t.stores.extend(method.store_names.iter().cloned());
            t.methods.insert(method.id, method);
        });
    }

    pub fn set_shipment_method_active(&self, id: ShipmentMethodId, is_active: bool) {
        self.write(|t| {
            if let Some(m) = t.methods.get_mut(&id) {
                m.is_active = is_active;
            }
        });
    }

    /// Point a method at another shipment type (or none).
    pub fn relate_shipment_method(&self, id: ShipmentMethodId, shipment_type_id: Option<ShipmentTypeId>) {
        self.write(|t| {
            if let Some(m) = t.methods.get_mut(&id) {
                m.shipment_type_id = shipment_type_id;
            }
        });
    }

    /// Make fetches that include `id` fail.
    pub fn fail_fetch_for(&self, id: ShipmentTypeId) {
        self.write(|t| {
            t.failing_shipment_type_ids.insert(id);
        });
    }

    /// Make carrier lookups that include `id` fail.
    pub fn fail_carrier_lookup_for(&self, id: ShipmentCarrierId) {
        self.write(|t| {
            t.failing_carrier_ids.insert(id);
        });
    }

    pub fn clear_failures(&self) {
        self.write(|t| {
            t.failing_shipment_type_ids.clear();
            t.failing_carrier_ids.clear();
        });
    }
}

impl EntityReader for InMemoryEntityReader {
    fn find_shipment_method_ids_by_carrier_ids(
        &self,
        carrier_ids: &[ShipmentCarrierId],
    ) -> Result<Vec<ShipmentMethodId>, EntityReadError> {
        let tables = self.read()?;
        if let Some(id) = carrier_ids.iter().find(|id| tables.failing_carrier_ids.contains(*id)) {
            return Err(EntityReadError::Query(format!("failed to look up carrier {id}")));
        }

        Ok(tables
            .methods
            .values()
            .filter(|m| carrier_ids.contains(&m.carrier_id))
            .map(|m| m.id)
            .collect())
    }

    fn find_shipment_type_ids_by_shipment_method_ids(
        &self,
        method_ids: &[ShipmentMethodId],
    ) -> Result<Vec<ShipmentTypeId>, EntityReadError> {
        let tables = self.read()?;
        Ok(method_ids
            .iter()
            .filter_map(|id| tables.methods.get(id))
            .filter_map(|m| m.shipment_type_id)
            .collect())
    }

    fn fetch_shipment_types_by_ids(
        &self,
        ids: &[ShipmentTypeId],
    ) -> Result<Vec<ShipmentType>, EntityReadError> {
        let tables = self.read()?;
        if let Some(id) = ids.iter().find(|id| tables.failing_shipment_type_ids.contains(*id)) {
            return Err(EntityReadError::Query(format!("failed to fetch shipment type {id}")));
        }

        Ok(ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| tables.shipment_types.get(id).cloned())
            .collect())
    }

    fn find_shipment_methods_by_shipment_type_ids(
        &self,
        shipment_type_ids: &[ShipmentTypeId],
    ) -> Result<Vec<ShipmentMethod>, EntityReadError> {
        let tables = self.read()?;
        Ok(tables
            .methods
            .values()
            .filter(|m| m.shipment_type_id.is_some_and(|t| shipment_type_ids.contains(&t)))
            .map(|m| ShipmentMethod {
                is_carrier_active: tables
                    .carriers
                    .get(&m.carrier_id)
                    .is_some_and(|c| c.is_active),
                ..m.clone()
            })
            .collect())
    }

    fn find_store_names(&self) -> Result<Vec<StoreName>, EntityReadError> {
        Ok(self.read()?.stores.iter().cloned().collect())
    }

    fn find_all_shipment_type_ids(&self) -> Result<Vec<ShipmentTypeId>, EntityReadError> {
        Ok(self.read()?.shipment_types.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(name: &str) -> StoreName {
        StoreName::new(name).unwrap()
    }

    #[test]
    fn carrier_activity_is_joined_on_read() {
        let reader = InMemoryEntityReader::new();
        let carrier_id = ShipmentCarrierId::new(1);
        reader.upsert_carrier(ShipmentCarrier {
            id: carrier_id,
            name: "DHL".into(),
            is_active: true,
        });
        reader.upsert_shipment_method(ShipmentMethod {
            id: ShipmentMethodId::new(10),
            carrier_id,
            is_active: true,
            is_carrier_active: false,
            shipment_type_id: Some(ShipmentTypeId::new(1)),
            store_names: [store("DE")].into_iter().collect(),
        });

        let methods = reader
            .find_shipment_methods_by_shipment_type_ids(&[ShipmentTypeId::new(1)])
            .unwrap();
        assert!(methods[0].is_carrier_active);

        reader.set_carrier_active(carrier_id, false);
        let methods = reader
            .find_shipment_methods_by_shipment_type_ids(&[ShipmentTypeId::new(1)])
            .unwrap();
        assert!(!methods[0].is_carrier_active);
        assert_eq!(reader.find_store_names().unwrap(), vec![store("DE")]);
    }

    #[test]
    fn fault_injection_fails_only_batches_containing_the_id() {
        let reader = InMemoryEntityReader::new();
        reader.fail_fetch_for(ShipmentTypeId::new(2));

        assert!(reader.fetch_shipment_types_by_ids(&[ShipmentTypeId::new(1)]).is_ok());
        assert!(
            reader
                .fetch_shipment_types_by_ids(&[ShipmentTypeId::new(1), ShipmentTypeId::new(2)])
                .is_err()
        );
    }
}
