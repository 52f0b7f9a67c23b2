//! Deterministic storage key generation.
//!
//! Key schema (ASCII, colon-delimited):
//! - primary:      `<resource>:<store>:<id>`
//! - uuid mapping: `<resource>:<store>:uuid:<uuid>`

use crate::id::{ShipmentTypeId, StoreName};

/// Delimiter between key segments.
pub const KEY_DELIMITER: char = ':';

/// Resource name shipment type projections are stored under.
pub const SHIPMENT_TYPE_RESOURCE_NAME: &str = "shipment_type";

const UUID_SEGMENT: &str = "uuid";

/// Builds storage keys for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeyGenerator {
    resource: String,
}

impl Default for StorageKeyGenerator {
    fn default() -> Self {
        Self::new(SHIPMENT_TYPE_RESOURCE_NAME)
    }
}

impl StorageKeyGenerator {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn primary_key(&self, store: &StoreName, id: ShipmentTypeId) -> String {
        format!("{}:{}:{}", self.resource, store, id)
    }

    pub fn uuid_mapping_key(&self, store: &StoreName, uuid: &str) -> String {
        format!("{}:{}:{}:{}", self.resource, store, UUID_SEGMENT, uuid)
    }

    /// Primary keys for `ids` in input order.
    pub fn primary_keys(&self, ids: &[ShipmentTypeId], store: &StoreName) -> Vec<String> {
        ids.iter().map(|id| self.primary_key(store, *id)).collect()
    }

    /// Uuid mapping keys for `uuids` in input order.
    pub fn uuid_mapping_keys<S: AsRef<str>>(&self, uuids: &[S], store: &StoreName) -> Vec<String> {
        uuids
            .iter()
            .map(|uuid| self.uuid_mapping_key(store, uuid.as_ref()))
            .collect()
    }

    /// Prefix shared by every key of this resource.
    pub fn resource_prefix(&self) -> String {
        format!("{}{}", self.resource, KEY_DELIMITER)
    }

    /// Inverse of [`Self::primary_key`].
    ///
    /// Returns `None` for uuid mapping keys, keys of other resources and
    /// anything that does not parse.
    pub fn parse_primary_key(&self, key: &str) -> Option<(StoreName, ShipmentTypeId)> {
        let rest = key.strip_prefix(self.resource.as_str())?.strip_prefix(KEY_DELIMITER)?;
        let (store, id) = rest.split_once(KEY_DELIMITER)?;
        if id.contains(KEY_DELIMITER) {
            return None;
        }
        let store = StoreName::new(store).ok()?;
        let id = id.parse().ok()?;
        Some((store, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn de() -> StoreName {
        StoreName::new("DE").unwrap()
    }

    #[test]
    fn builds_keys_in_documented_format() {
        let keys = StorageKeyGenerator::default();
        assert_eq!(keys.primary_key(&de(), ShipmentTypeId::new(7)), "shipment_type:DE:7");
        assert_eq!(keys.uuid_mapping_key(&de(), "abc"), "shipment_type:DE:uuid:abc");
    }

    #[test]
    fn batch_generation_preserves_order_and_short_circuits() {
        let keys = StorageKeyGenerator::new("st");
        let ids = [ShipmentTypeId::new(3), ShipmentTypeId::new(1), ShipmentTypeId::new(3)];
        assert_eq!(keys.primary_keys(&ids, &de()), vec!["st:DE:3", "st:DE:1", "st:DE:3"]);
        assert!(keys.primary_keys(&[], &de()).is_empty());
        assert!(keys.uuid_mapping_keys::<&str>(&[], &de()).is_empty());
        assert_eq!(keys.uuid_mapping_keys(&["b", "a"], &de()), vec!["st:DE:uuid:b", "st:DE:uuid:a"]);
    }

    #[test]
    fn parses_only_primary_keys_of_own_resource() {
        let keys = StorageKeyGenerator::default();
        assert_eq!(
            keys.parse_primary_key("shipment_type:AT:12"),
            Some((StoreName::new("AT").unwrap(), ShipmentTypeId::new(12)))
        );
        assert_eq!(keys.parse_primary_key("shipment_type:AT:uuid:xyz"), None);
        assert_eq!(keys.parse_primary_key("product:AT:12"), None);
        assert_eq!(keys.parse_primary_key("shipment_type_x:AT:12"), None);
        assert_eq!(keys.parse_primary_key("shipment_type:AT:abc"), None);
    }
}
