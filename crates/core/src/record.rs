//! Denormalized storage records (the read model).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::entity::ShipmentType;
use crate::id::{ShipmentMethodId, ShipmentTypeId, StoreName};

/// Storage payload of one shipment type in one store.
///
/// Serialized as:
///
/// ```json
/// {"idShipmentType": 1, "key": "std", "uuid": "u1", "name": "Standard", "shipmentMethodIds": [3]}
/// ```
///
/// Fields contributed by expanders land in `extensions` and are flattened into
/// the same object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentTypeStorageRecord {
    pub id_shipment_type: ShipmentTypeId,
    pub key: String,
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub shipment_method_ids: BTreeSet<ShipmentMethodId>,
    #[serde(flatten)]
    pub extensions: Map<String, JsonValue>,
}

impl ShipmentTypeStorageRecord {
    /// Record with identity fields copied from the transactional entity and no methods.
    pub fn from_shipment_type(shipment_type: &ShipmentType) -> Self {
        Self {
            id_shipment_type: shipment_type.id,
            key: shipment_type.key.clone(),
            uuid: shipment_type.uuid.clone(),
            name: shipment_type.name.clone(),
            shipment_method_ids: BTreeSet::new(),
            extensions: Map::new(),
        }
    }

    pub fn with_shipment_method_ids(
        mut self,
        ids: impl IntoIterator<Item = ShipmentMethodId>,
    ) -> Self {
        self.shipment_method_ids = ids.into_iter().collect();
        self
    }

    pub fn to_payload(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_payload(payload: JsonValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload)
    }
}

/// A record bound to the store it is projected for.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentTypeStorageProjection {
    pub store: StoreName,
    pub record: ShipmentTypeStorageRecord,
}

impl ShipmentTypeStorageProjection {
    pub fn shipment_type_id(&self) -> ShipmentTypeId {
        self.record.id_shipment_type
    }
}

/// Payload of a uuid mapping entry: `{"id": <shipment type id>}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UuidMapping {
    pub id: ShipmentTypeId,
}

impl UuidMapping {
    pub const KEY_ID: &'static str = "id";

    /// Lenient extraction of the mapped id.
    ///
    /// Accepts integer ids and numeric strings; anything else is treated as absent.
    pub fn extract_id(payload: &JsonValue) -> Option<ShipmentTypeId> {
        match payload.get(Self::KEY_ID)? {
            JsonValue::Number(n) => n.as_i64().map(ShipmentTypeId::new),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_uses_storage_field_names() {
        let record = ShipmentTypeStorageRecord {
            id_shipment_type: ShipmentTypeId::new(1),
            key: "std".into(),
            uuid: "u1".into(),
            name: "Standard".into(),
            shipment_method_ids: [ShipmentMethodId::new(5), ShipmentMethodId::new(2)]
                .into_iter()
                .collect(),
            extensions: Map::new(),
        };

        assert_eq!(
            record.to_payload().unwrap(),
            json!({
                "idShipmentType": 1,
                "key": "std",
                "uuid": "u1",
                "name": "Standard",
                "shipmentMethodIds": [2, 5],
            })
        );
    }

    #[test]
    fn unknown_fields_are_kept_as_extensions() {
        let record = ShipmentTypeStorageRecord::from_payload(json!({
            "idShipmentType": 4,
            "key": "exp",
            "uuid": "u4",
            "name": "Express",
            "priority": 2,
        }))
        .unwrap();

        assert!(record.shipment_method_ids.is_empty());
        assert_eq!(record.extensions.get("priority"), Some(&json!(2)));
    }

    #[test]
    fn mapping_id_extraction_is_lenient() {
        assert_eq!(UuidMapping::extract_id(&json!({"id": 3})), Some(ShipmentTypeId::new(3)));
        assert_eq!(UuidMapping::extract_id(&json!({"id": "9"})), Some(ShipmentTypeId::new(9)));
        assert_eq!(UuidMapping::extract_id(&json!({"id": null})), None);
        assert_eq!(UuidMapping::extract_id(&json!({})), None);
        assert_eq!(UuidMapping::extract_id(&json!([1, 2])), None);
    }
}
