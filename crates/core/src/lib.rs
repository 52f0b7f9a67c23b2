//! `shipment-storage-core`: domain foundation for the shipment type storage projection.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, transactional entity views, the storage record shape, the
//! eligibility rule and the storage key schema.

pub mod entity;
pub mod error;
pub mod id;
pub mod key;
pub mod record;

pub use entity::{
    Entity, ShipmentCarrier, ShipmentMethod, ShipmentType, eligible_shipment_method_ids,
};
pub use error::{DomainError, DomainResult};
pub use id::{ShipmentCarrierId, ShipmentMethodId, ShipmentTypeId, StoreName};
pub use key::{KEY_DELIMITER, SHIPMENT_TYPE_RESOURCE_NAME, StorageKeyGenerator};
pub use record::{ShipmentTypeStorageProjection, ShipmentTypeStorageRecord, UuidMapping};
