//! Read side of the normalized transactional data.
//!
//! The projection only ever reads shipment types, shipment methods, carriers
//! and stores through [`EntityReader`]; it never writes them.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use shipment_storage_core::{
    ShipmentCarrierId, ShipmentMethod, ShipmentMethodId, ShipmentType, ShipmentTypeId, StoreName,
};

pub use in_memory::InMemoryEntityReader;
pub use postgres::PostgresEntityReader;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityReadError {
    #[error("entity source connection error: {0}")]
    Connection(String),

    #[error("entity query failed: {0}")]
    Query(String),

    /// A row could not be mapped onto a domain entity.
    #[error("invalid entity data: {0}")]
    InvalidData(String),
}

/// Batched lookups against the transactional store.
///
/// All methods take the full id batch at once; implementations are expected
/// to answer each call with a bounded number of queries.
pub trait EntityReader: Send + Sync {
    /// Ids of the shipment methods owned by any of `carrier_ids`.
    fn find_shipment_method_ids_by_carrier_ids(
        &self,
        carrier_ids: &[ShipmentCarrierId],
    ) -> Result<Vec<ShipmentMethodId>, EntityReadError>;

    /// Ids of the shipment types any of `method_ids` is related to.
    fn find_shipment_type_ids_by_shipment_method_ids(
        &self,
        method_ids: &[ShipmentMethodId],
    ) -> Result<Vec<ShipmentTypeId>, EntityReadError>;

    /// Shipment types with their active flag and store relations.
    ///
    /// Ids that do not exist are absent from the result.
    fn fetch_shipment_types_by_ids(
        &self,
        ids: &[ShipmentTypeId],
    ) -> Result<Vec<ShipmentType>, EntityReadError>;

    /// Shipment methods related to any of `shipment_type_ids`, joined with
    /// carrier activity and store availability.
    fn find_shipment_methods_by_shipment_type_ids(
        &self,
        shipment_type_ids: &[ShipmentTypeId],
    ) -> Result<Vec<ShipmentMethod>, EntityReadError>;

    /// Names of all stores known to the platform.
    fn find_store_names(&self) -> Result<Vec<StoreName>, EntityReadError>;

    /// Ids of every shipment type (full rebuild).
    fn find_all_shipment_type_ids(&self) -> Result<Vec<ShipmentTypeId>, EntityReadError>;
}

impl<R> EntityReader for Arc<R>
where
    R: EntityReader + ?Sized,
{
    fn find_shipment_method_ids_by_carrier_ids(
        &self,
        carrier_ids: &[ShipmentCarrierId],
    ) -> Result<Vec<ShipmentMethodId>, EntityReadError> {
        (**self).find_shipment_method_ids_by_carrier_ids(carrier_ids)
    }

    fn find_shipment_type_ids_by_shipment_method_ids(
        &self,
        method_ids: &[ShipmentMethodId],
    ) -> Result<Vec<ShipmentTypeId>, EntityReadError> {
        (**self).find_shipment_type_ids_by_shipment_method_ids(method_ids)
    }

    fn fetch_shipment_types_by_ids(
        &self,
        ids: &[ShipmentTypeId],
    ) -> Result<Vec<ShipmentType>, EntityReadError> {
        (**self).fetch_shipment_types_by_ids(ids)
    }

    fn find_shipment_methods_by_shipment_type_ids(
        &self,
        shipment_type_ids: &[ShipmentTypeId],
    ) -> Result<Vec<ShipmentMethod>, EntityReadError> {
        (**self).find_shipment_methods_by_shipment_type_ids(shipment_type_ids)
    }

    fn find_store_names(&self) -> Result<Vec<StoreName>, EntityReadError> {
        (**self).find_store_names()
    }

    fn find_all_shipment_type_ids(&self) -> Result<Vec<ShipmentTypeId>, EntityReadError> {
        (**self).find_all_shipment_type_ids()
    }
}
