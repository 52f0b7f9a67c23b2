//! Transactional entity views consumed by the projection.
//!
//! These are read-only snapshots of the normalized data the storage projection
//! is derived from. They are produced by an entity reader and never mutated by
//! the projection itself.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::{ShipmentCarrierId, ShipmentMethodId, ShipmentTypeId, StoreName};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// A shipment type together with its active flag and store relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentType {
    pub id: ShipmentTypeId,
    pub key: String,
    pub uuid: String,
    pub name: String,
    pub is_active: bool,
    /// Stores this type currently has a relation to.
    pub store_names: BTreeSet<StoreName>,
}

impl ShipmentType {
    /// A projection should exist for `store` iff this returns true.
    pub fn is_published_in(&self, store: &StoreName) -> bool {
        self.is_active && self.store_names.contains(store)
    }
}

impl Entity for ShipmentType {
    type Id = ShipmentTypeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Logistics provider owning one or more shipment methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentCarrier {
    pub id: ShipmentCarrierId,
    pub name: String,
    pub is_active: bool,
}

impl Entity for ShipmentCarrier {
    type Id = ShipmentCarrierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A shipment method joined with the active flag of its carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentMethod {
    pub id: ShipmentMethodId,
    pub carrier_id: ShipmentCarrierId,
    pub is_active: bool,
    pub is_carrier_active: bool,
    /// Shipment type this method is explicitly related to, if any.
    pub shipment_type_id: Option<ShipmentTypeId>,
    /// Stores the method is available in.
    pub store_names: BTreeSet<StoreName>,
}

impl ShipmentMethod {
    /// Eligibility of this method for `shipment_type_id` in `store`.
    ///
    /// The method must be active, its carrier must be active, it must be
    /// related to the shipment type and it must be available in the store.
    pub fn is_eligible_for(&self, shipment_type_id: ShipmentTypeId, store: &StoreName) -> bool {
        self.is_active
            && self.is_carrier_active
            && self.shipment_type_id == Some(shipment_type_id)
            && self.store_names.contains(store)
    }
}

impl Entity for ShipmentMethod {
    type Id = ShipmentMethodId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Ids of all methods in `methods` eligible for `shipment_type_id` in `store`.
///
/// Always a full recomputation over the given methods; duplicates collapse.
pub fn eligible_shipment_method_ids<'a>(
    methods: impl IntoIterator<Item = &'a ShipmentMethod>,
    shipment_type_id: ShipmentTypeId,
    store: &StoreName,
) -> BTreeSet<ShipmentMethodId> {
    methods
        .into_iter()
        .filter(|m| m.is_eligible_for(shipment_type_id, store))
        .map(|m| m.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store(name: &str) -> StoreName {
        StoreName::new(name).unwrap()
    }

    fn method(
        id: i64,
        is_active: bool,
        is_carrier_active: bool,
        type_id: Option<i64>,
        stores: &[&str],
    ) -> ShipmentMethod {
        ShipmentMethod {
            id: ShipmentMethodId::new(id),
            carrier_id: ShipmentCarrierId::new(1),
            is_active,
            is_carrier_active,
            shipment_type_id: type_id.map(ShipmentTypeId::new),
            store_names: stores.iter().map(|s| store(s)).collect(),
        }
    }

    #[test]
    fn inactive_type_is_never_published() {
        let ty = ShipmentType {
            id: ShipmentTypeId::new(1),
            key: "std".into(),
            uuid: "u1".into(),
            name: "Standard".into(),
            is_active: false,
            store_names: [store("DE")].into_iter().collect(),
        };
        assert!(!ty.is_published_in(&store("DE")));
    }

    #[test]
    fn eligible_ids_filter_each_condition() {
        let de = store("DE");
        let t = ShipmentTypeId::new(7);
        let methods = vec![
            method(1, true, true, Some(7), &["DE"]),
            method(2, false, true, Some(7), &["DE"]),
            method(3, true, false, Some(7), &["DE"]),
            method(4, true, true, Some(8), &["DE"]),
            method(5, true, true, None, &["DE"]),
            method(6, true, true, Some(7), &["AT"]),
        ];

        let ids = eligible_shipment_method_ids(&methods, t, &de);
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![ShipmentMethodId::new(1)]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: membership equals the conjunction of the four conditions.
        #[test]
        fn eligibility_is_the_conjunction_of_conditions(
            is_active in any::<bool>(),
            is_carrier_active in any::<bool>(),
            related in any::<bool>(),
            in_store in any::<bool>(),
        ) {
            let de = store("DE");
            let t = ShipmentTypeId::new(3);
            let m = method(
                10,
                is_active,
                is_carrier_active,
                if related { Some(3) } else { Some(4) },
                if in_store { &["DE"] } else { &["AT"] },
            );

            let expected = is_active && is_carrier_active && related && in_store;
            prop_assert_eq!(m.is_eligible_for(t, &de), expected);
            prop_assert_eq!(eligible_shipment_method_ids([&m], t, &de).contains(&m.id), expected);
        }
    }
}
