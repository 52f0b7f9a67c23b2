//! Lookup criteria for the storage reader.

use serde::{Deserialize, Serialize};

use shipment_storage_core::{DomainError, DomainResult, ShipmentTypeId, StoreName};

/// Conditions of a storage lookup.
///
/// `uuids` and `shipment_type_ids` are alternatives; when both are set the
/// uuids win. `store_name` is mandatory as soon as either list is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentTypeStorageConditions {
    #[serde(default)]
    uuids: Vec<String>,
    #[serde(default)]
    shipment_type_ids: Vec<ShipmentTypeId>,
    #[serde(default)]
    store_name: Option<String>,
}

impl ShipmentTypeStorageConditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuids.push(uuid.into());
        self
    }

    pub fn with_uuids<I, S>(mut self, uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uuids = uuids.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_shipment_type_id(mut self, id: ShipmentTypeId) -> Self {
        self.shipment_type_ids.push(id);
        self
    }

    pub fn with_shipment_type_ids(mut self, ids: impl IntoIterator<Item = ShipmentTypeId>) -> Self {
        self.shipment_type_ids = ids.into_iter().collect();
        self
    }

    pub fn with_store_name(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = Some(store_name.into());
        self
    }

    pub fn uuids(&self) -> &[String] {
        &self.uuids
    }

    pub fn shipment_type_ids(&self) -> &[ShipmentTypeId] {
        &self.shipment_type_ids
    }

    pub fn store_name(&self) -> Option<&str> {
        self.store_name.as_deref()
    }

    fn require_store_name(&self) -> DomainResult<StoreName> {
        match self.store_name.as_deref() {
            Some(name) => StoreName::new(name),
            None => Err(DomainError::missing("store_name")),
        }
    }
}

/// Criteria wrapper; `conditions` are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentTypeStorageCriteria {
    #[serde(default)]
    shipment_type_storage_conditions: Option<ShipmentTypeStorageConditions>,
}

impl ShipmentTypeStorageCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conditions(mut self, conditions: ShipmentTypeStorageConditions) -> Self {
        self.shipment_type_storage_conditions = Some(conditions);
        self
    }

    pub fn conditions(&self) -> Option<&ShipmentTypeStorageConditions> {
        self.shipment_type_storage_conditions.as_ref()
    }

    /// Validate the criteria into a concrete lookup.
    ///
    /// This is the single precondition check of the read path; it performs no I/O.
    pub fn to_lookup(&self) -> DomainResult<Lookup> {
        let conditions = self
            .conditions()
            .ok_or(DomainError::missing("shipment_type_storage_conditions"))?;

        if !conditions.uuids.is_empty() {
            return Ok(Lookup::ByUuids {
                uuids: conditions.uuids.clone(),
                store: conditions.require_store_name()?,
            });
        }

        if !conditions.shipment_type_ids.is_empty() {
            return Ok(Lookup::ByIds {
                ids: conditions.shipment_type_ids.clone(),
                store: conditions.require_store_name()?,
            });
        }

        Ok(Lookup::Empty)
    }
}

/// A validated lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Nothing to look up; the result is empty without touching storage.
    Empty,
    ByUuids { uuids: Vec<String>, store: StoreName },
    ByIds { ids: Vec<ShipmentTypeId>, store: StoreName },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_conditions_is_a_precondition_violation() {
        let err = ShipmentTypeStorageCriteria::new().to_lookup().unwrap_err();
        assert_eq!(err, DomainError::MissingField("shipment_type_storage_conditions"));
    }

    #[test]
    fn missing_store_name_is_a_precondition_violation() {
        let criteria = ShipmentTypeStorageCriteria::new().with_conditions(
            ShipmentTypeStorageConditions::new().add_shipment_type_id(ShipmentTypeId::new(1)),
        );
        assert_eq!(criteria.to_lookup().unwrap_err(), DomainError::MissingField("store_name"));

        let criteria = ShipmentTypeStorageCriteria::new().with_conditions(
            ShipmentTypeStorageConditions::new().add_uuid("u1").with_store_name(""),
        );
        assert!(criteria.to_lookup().is_err());
    }

    #[test]
    fn empty_conditions_yield_empty_lookup() {
        let criteria =
            ShipmentTypeStorageCriteria::new().with_conditions(ShipmentTypeStorageConditions::new());
        assert_eq!(criteria.to_lookup().unwrap(), Lookup::Empty);
    }

    #[test]
    fn uuids_take_precedence_over_ids() {
        let criteria = ShipmentTypeStorageCriteria::new().with_conditions(
            ShipmentTypeStorageConditions::new()
                .add_shipment_type_id(ShipmentTypeId::new(1))
                .add_uuid("u1")
                .with_store_name("DE"),
        );
        assert_eq!(
            criteria.to_lookup().unwrap(),
            Lookup::ByUuids {
                uuids: vec!["u1".to_string()],
                store: StoreName::new("DE").unwrap(),
            }
        );
    }
}
